//! Deterministic graph construction from raw book records.
//!
//! One pass per entity kind (books first, then name-deduplicated authors,
//! publishers, translators, series), then one relation pass emitting
//! reciprocal edge pairs for every resolvable (book, related-entity) pair.
//!
//! Malformed or missing input degrades to empty collections; a single bad
//! record is skipped, never fatal.

use ahash::AHashMap;
use tracing::info;

use crate::model::{
    EntityId, EntityKind, EntityStore, KnowledgeGraph, RawBookRecord, RelationLabel,
    RelationStore,
};
use crate::present;

/// Build the knowledge graph from raw tabular book records.
pub fn build_graph(records: &[RawBookRecord]) -> KnowledgeGraph {
    let mut entities = EntityStore::new();

    // Book pass: a record without a join key cannot be referenced and is
    // skipped outright.
    for rec in records {
        let Some(url) = present(&rec.url) else {
            continue;
        };
        entities.add(
            EntityKind::Book,
            rec.name.clone().unwrap_or_default(),
            Some(url.to_string()),
            rec.rating,
        );
    }

    let authors = dedup_pass(records, &mut entities, EntityKind::Author, |r| &r.author);
    let publishers = dedup_pass(records, &mut entities, EntityKind::Publisher, |r| {
        &r.publisher
    });
    let translators = dedup_pass(records, &mut entities, EntityKind::Translator, |r| {
        &r.translator
    });
    let series = dedup_pass(records, &mut entities, EntityKind::Series, |r| &r.series);

    let mut relations = RelationStore::new();
    for rec in records {
        let Some(url) = present(&rec.url) else {
            continue;
        };
        let Some(book_id) = entities.book_by_url(url) else {
            continue;
        };

        link(&mut relations, book_id, RelationLabel::WrittenBy, &rec.author, &authors);
        link(
            &mut relations,
            book_id,
            RelationLabel::PublishedBy,
            &rec.publisher,
            &publishers,
        );
        link(
            &mut relations,
            book_id,
            RelationLabel::TranslatedBy,
            &rec.translator,
            &translators,
        );
        link(&mut relations, book_id, RelationLabel::BelongsTo, &rec.series, &series);
    }

    let graph = KnowledgeGraph {
        entities,
        relations,
    };
    let stats = graph.stats();
    info!(
        books = stats.books,
        authors = stats.authors,
        publishers = stats.publishers,
        translators = stats.translators,
        series = stats.series,
        relations = stats.relations,
        "knowledge graph built"
    );
    graph
}

/// One dedup pass over the records for a single named entity kind.
fn dedup_pass(
    records: &[RawBookRecord],
    entities: &mut EntityStore,
    kind: EntityKind,
    field: impl Fn(&RawBookRecord) -> &Option<String>,
) -> AHashMap<String, EntityId> {
    let mut seen: AHashMap<String, EntityId> = AHashMap::new();
    for rec in records {
        let Some(name) = present(field(rec)) else {
            continue;
        };
        if seen.contains_key(name) {
            continue;
        }
        let id = entities.add(kind, name.to_string(), None, None);
        seen.insert(name.to_string(), id);
    }
    seen
}

fn link(
    relations: &mut RelationStore,
    book_id: EntityId,
    label: RelationLabel,
    field: &Option<String>,
    index: &AHashMap<String, EntityId>,
) {
    let Some(name) = present(field) else {
        return;
    };
    if let Some(&target) = index.get(name) {
        relations.add_pair(book_id, label, target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Relation;
    use proptest::prelude::*;

    fn rec(url: &str, name: &str, author: &str) -> RawBookRecord {
        RawBookRecord {
            url: Some(url.to_string()),
            name: Some(name.to_string()),
            author: Some(author.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn entity_ids_are_unique_and_counts_add_up() {
        let records = vec![
            rec("u/1", "A", "X"),
            rec("u/2", "B", "X"),
            rec("u/3", "C", "Y"),
        ];
        let graph = build_graph(&records);

        let mut ids: Vec<_> = graph.entities.iter().map(|e| e.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), graph.entities.len());

        let stats = graph.stats();
        assert_eq!(
            graph.entities.len(),
            stats.books + stats.authors + stats.publishers + stats.translators + stats.series
        );
        assert_eq!(stats.books, 3);
        assert_eq!(stats.authors, 2);
    }

    #[test]
    fn shared_author_name_creates_one_entity() {
        let records = vec![rec("u/1", "A", "Same Author"), rec("u/2", "B", "Same Author")];
        let graph = build_graph(&records);
        assert_eq!(graph.entities.count(EntityKind::Author), 1);
    }

    #[test]
    fn absent_sentinels_do_not_become_entities() {
        let records = vec![
            RawBookRecord {
                url: Some("u/1".into()),
                name: Some("A".into()),
                author: Some("".into()),
                publisher: Some("nan".into()),
                translator: Some("NULL".into()),
                ..Default::default()
            },
            // No join key: the whole record is skipped in the book pass.
            RawBookRecord {
                name: Some("ghost".into()),
                author: Some("Z".into()),
                ..Default::default()
            },
        ];
        let graph = build_graph(&records);
        assert_eq!(graph.entities.count(EntityKind::Book), 1);
        assert_eq!(graph.entities.count(EntityKind::Publisher), 0);
        assert_eq!(graph.entities.count(EntityKind::Translator), 0);
        // The keyless record still contributes its author entity: the author
        // pass dedups by name alone.
        assert_eq!(graph.entities.count(EntityKind::Author), 1);
    }

    #[test]
    fn empty_input_builds_empty_graph() {
        let graph = build_graph(&[]);
        assert!(graph.entities.is_empty());
        assert!(graph.relations.is_empty());
    }

    #[test]
    fn relations_link_resolved_endpoints_only() {
        let records = vec![
            RawBookRecord {
                url: Some("u/1".into()),
                name: Some("A".into()),
                author: Some("X".into()),
                series: Some("S".into()),
                ..Default::default()
            },
            RawBookRecord {
                url: Some("u/2".into()),
                name: Some("B".into()),
                // Absent author: no written_by pair for this book.
                ..Default::default()
            },
        ];
        let graph = build_graph(&records);
        // One written_by pair + one belongs_to pair.
        assert_eq!(graph.relations.len(), 4);

        let book = graph.entities.book_by_url("u/1").unwrap();
        let authors = graph.neighbors_of_kind(book, EntityKind::Author);
        assert_eq!(authors.len(), 1);
        assert_eq!(
            graph.entities.get(authors[0]).unwrap().name,
            "X".to_string()
        );
    }

    proptest! {
        /// Every relation in a built graph has its reciprocal present.
        #[test]
        fn relations_are_reciprocal(authors in proptest::collection::vec("[a-c]{1,2}", 0..12)) {
            let records: Vec<RawBookRecord> = authors
                .iter()
                .enumerate()
                .map(|(i, a)| rec(&format!("u/{i}"), &format!("book-{i}"), a))
                .collect();
            let graph = build_graph(&records);
            for rel in graph.relations.iter() {
                let mirror = Relation {
                    head: rel.tail,
                    label: rel.label.reciprocal(),
                    tail: rel.head,
                };
                prop_assert!(graph.relations.iter().any(|r| *r == mirror));
            }
        }
    }
}
