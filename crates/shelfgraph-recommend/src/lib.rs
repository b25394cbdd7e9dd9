//! Recommendation scoring for shelfgraph.
//!
//! Blends two signals over the loaded graph and keyword index:
//!
//! - **Graph relations**: books sharing a series/author/translator/publisher
//!   with a favorite, each relation kind carrying a fixed weight.
//! - **Keyword overlap**: books carrying the favorites' preference keywords,
//!   found through the inverted index.
//!
//! plus a quality/popularity boost for candidates the signals surfaced.
//! Every contribution records a human-readable reason; the ranked result
//! explains itself.
//!
//! The [`Recommender`] is an explicitly constructed service object over
//! shared read-only state. Scoring never writes; concurrent requests need
//! no locking.

pub mod request;
pub mod scorer;
pub mod weights;

pub use request::{RecommendRequest, RelationKind, Strategy};
pub use scorer::{Recommendation, Recommender};
pub use weights::ScoringWeights;
