//! Comment keyword mining for shelfgraph.
//!
//! Turns raw per-book reader comments into a ranked, weighted keyword
//! profile per book plus engagement statistics:
//!
//! 1. Partition each book's comments by rating, preferring high-rating text.
//! 2. Run two independent term-weighting passes over the same
//!    part-of-speech allow-list: statistical TF-IDF and co-occurrence-graph
//!    centrality.
//! 3. Merge, filter through the stopword set and the feature classifier,
//!    rank by weight.
//! 4. Fold everything into a [`KeywordIndex`] with an inverted
//!    keyword → books index, persisted as one whole-corpus cache blob.
//!
//! The per-book step is embarrassingly parallel and runs on a rayon pool
//! sized to `available_parallelism - 1`.

pub mod classifier;
pub mod index;
pub mod lexicon;
pub mod pipeline;
pub mod stopwords;
pub mod textrank;
pub mod tfidf;
pub mod token;
pub mod vocab;

pub use classifier::is_feature_keyword;
pub use index::{
    load_cache, save_cache, BookKeywordRecord, CommentStats, KeywordIndex,
};
pub use lexicon::{Lexicon, PosTag};
pub use pipeline::{mine_keywords, mine_or_load, MiningConfig, RawCommentRecord};
pub use stopwords::Stopwords;
