//! Shelfgraph knowledge graph core.
//!
//! A typed multi-relational graph over book metadata:
//!
//! - **Entities**: books, authors, publishers, translators, series. Dense
//!   `u32` ids assigned at build time, stable for the lifetime of a built
//!   graph.
//! - **Relations**: directed, labeled edges, always stored as reciprocal
//!   pairs (`written_by`/`write`, ...) so traversal from either endpoint is
//!   O(1) without a reverse-index rebuild.
//! - **Persistence**: two independent bincode blobs (entities, relations),
//!   each in a version-tagged envelope. A caller can reload either without
//!   the other.
//!
//! The graph is built once offline and loaded read-only by the serving
//! process; nothing here mutates after load.

pub mod builder;
pub mod model;
pub mod store;

pub use builder::build_graph;
pub use model::{
    Entity, EntityId, EntityKind, EntityStore, GraphStats, KnowledgeGraph, RawBookRecord,
    Relation, RelationLabel, RelationStore,
};
pub use store::{
    load_blob, load_entities, load_relations, save_blob, save_entities, save_relations,
    StoreError, STORE_FORMAT_VERSION,
};

/// Normalize an optional raw field to a present string.
///
/// The raw tables encode absent data either as an empty string or as the
/// stringified missing-value token (`"nan"`, `"null"`); neither may become a
/// spurious entity.
pub(crate) fn present(field: &Option<String>) -> Option<&str> {
    let s = field.as_deref()?;
    if s.is_empty() || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("null") {
        None
    } else {
        Some(s)
    }
}
