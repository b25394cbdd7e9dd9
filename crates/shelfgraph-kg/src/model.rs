//! Entity/relation model and the in-memory graph stores.
//!
//! Layout follows a columnar-ish store design: a flat entity vector indexed
//! by id, a per-kind bitmap index, and an adjacency table for O(1) neighbor
//! lookup. Entity-id sets use Roaring bitmaps.

use ahash::AHashMap;
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Dense, 0-based entity identifier, assigned at construction.
pub type EntityId = u32;

// ============================================================================
// Entities
// ============================================================================

/// The five entity kinds in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Book,
    Author,
    Publisher,
    Translator,
    Series,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Book,
        EntityKind::Author,
        EntityKind::Publisher,
        EntityKind::Translator,
        EntityKind::Series,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Book => "book",
            EntityKind::Author => "author",
            EntityKind::Publisher => "publisher",
            EntityKind::Translator => "translator",
            EntityKind::Series => "series",
        }
    }
}

/// A node in the knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub name: String,
    /// External join key; unique per book, absent for non-book entities.
    pub url: Option<String>,
    /// Editorial rating on a 10-point scale, when known.
    pub rating: Option<f32>,
}

// ============================================================================
// Relations
// ============================================================================

/// Relation labels. Every semantic relation is stored as a reciprocal pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationLabel {
    WrittenBy,
    Write,
    PublishedBy,
    Publish,
    TranslatedBy,
    Translate,
    BelongsTo,
    Contains,
}

impl RelationLabel {
    /// The paired label for the reverse edge.
    pub fn reciprocal(self) -> RelationLabel {
        match self {
            RelationLabel::WrittenBy => RelationLabel::Write,
            RelationLabel::Write => RelationLabel::WrittenBy,
            RelationLabel::PublishedBy => RelationLabel::Publish,
            RelationLabel::Publish => RelationLabel::PublishedBy,
            RelationLabel::TranslatedBy => RelationLabel::Translate,
            RelationLabel::Translate => RelationLabel::TranslatedBy,
            RelationLabel::BelongsTo => RelationLabel::Contains,
            RelationLabel::Contains => RelationLabel::BelongsTo,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RelationLabel::WrittenBy => "written_by",
            RelationLabel::Write => "write",
            RelationLabel::PublishedBy => "published_by",
            RelationLabel::Publish => "publish",
            RelationLabel::TranslatedBy => "translated_by",
            RelationLabel::Translate => "translate",
            RelationLabel::BelongsTo => "belongs_to",
            RelationLabel::Contains => "contains",
        }
    }
}

/// A directed typed edge `(head, label, tail)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub head: EntityId,
    pub label: RelationLabel,
    pub tail: EntityId,
}

// ============================================================================
// Entity store
// ============================================================================

/// Flat entity storage with a per-kind bitmap index and a book-url index.
///
/// Persisted on its own as the entity blob.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityStore {
    entities: Vec<Entity>,
    /// kind -> bitmap of entity ids
    kind_index: HashMap<EntityKind, RoaringBitmap>,
    /// book join key -> entity id
    url_index: AHashMap<String, EntityId>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Add an entity, returning its fresh id.
    pub fn add(
        &mut self,
        kind: EntityKind,
        name: String,
        url: Option<String>,
        rating: Option<f32>,
    ) -> EntityId {
        let id = self.entities.len() as EntityId;
        if let Some(u) = &url {
            self.url_index.insert(u.clone(), id);
        }
        self.kind_index.entry(kind).or_default().insert(id);
        self.entities.push(Entity {
            id,
            kind,
            name,
            url,
            rating,
        });
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id as usize)
    }

    /// Ids of all entities of a kind.
    pub fn by_kind(&self, kind: EntityKind) -> impl Iterator<Item = EntityId> + '_ {
        self.kind_index
            .get(&kind)
            .into_iter()
            .flat_map(|bm| bm.iter())
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.kind_index
            .get(&kind)
            .map(|bm| bm.len() as usize)
            .unwrap_or(0)
    }

    /// Resolve a book by its external join key.
    pub fn book_by_url(&self, url: &str) -> Option<EntityId> {
        self.url_index.get(url).copied()
    }

    /// Resolve a book by name: exact case-insensitive match first, then
    /// substring containment in either direction.
    pub fn find_book_by_name(&self, name: &str) -> Option<EntityId> {
        let needle = name.to_lowercase();

        for id in self.by_kind(EntityKind::Book) {
            let entity = &self.entities[id as usize];
            if entity.name.to_lowercase() == needle {
                return Some(id);
            }
        }

        for id in self.by_kind(EntityKind::Book) {
            let hay = self.entities[id as usize].name.to_lowercase();
            if hay.contains(&needle) || needle.contains(&hay) {
                return Some(id);
            }
        }

        None
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }
}

// ============================================================================
// Relation store
// ============================================================================

/// Relation list plus adjacency, persisted on its own as the relation blob.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationStore {
    relations: Vec<Relation>,
    /// entity id -> outgoing (label, neighbor) pairs
    adjacency: AHashMap<EntityId, Vec<(RelationLabel, EntityId)>>,
}

impl RelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Add a semantic relation as its reciprocal edge pair.
    pub fn add_pair(&mut self, head: EntityId, label: RelationLabel, tail: EntityId) {
        self.push(Relation { head, label, tail });
        self.push(Relation {
            head: tail,
            label: label.reciprocal(),
            tail: head,
        });
    }

    fn push(&mut self, rel: Relation) {
        self.adjacency
            .entry(rel.head)
            .or_default()
            .push((rel.label, rel.tail));
        self.relations.push(rel);
    }

    /// Outgoing (label, neighbor) pairs for an entity.
    pub fn neighbors(&self, id: EntityId) -> &[(RelationLabel, EntityId)] {
        self.adjacency.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Neighbors reached from an entity over one relation label.
    pub fn neighbors_with_label(&self, id: EntityId, label: RelationLabel) -> Vec<EntityId> {
        self.neighbors(id)
            .iter()
            .filter(|(l, _)| *l == label)
            .map(|(_, tail)| *tail)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relation> {
        self.relations.iter()
    }
}

// ============================================================================
// Combined graph
// ============================================================================

/// Aggregate corpus statistics, one count per entity kind plus relations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub books: usize,
    pub authors: usize,
    pub publishers: usize,
    pub translators: usize,
    pub series: usize,
    pub relations: usize,
}

/// The whole graph: both stores, loaded together for serving. Persistence
/// happens per store (two independent blobs), never on this aggregate.
#[derive(Debug, Default)]
pub struct KnowledgeGraph {
    pub entities: EntityStore,
    pub relations: RelationStore,
}

impl KnowledgeGraph {
    /// Neighbors of an entity whose own kind matches `kind`.
    pub fn neighbors_of_kind(&self, id: EntityId, kind: EntityKind) -> Vec<EntityId> {
        self.relations
            .neighbors(id)
            .iter()
            .filter(|(_, tail)| {
                self.entities
                    .get(*tail)
                    .is_some_and(|e| e.kind == kind)
            })
            .map(|(_, tail)| *tail)
            .collect()
    }

    pub fn book_ids(&self) -> Vec<EntityId> {
        self.entities.by_kind(EntityKind::Book).collect()
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            books: self.entities.count(EntityKind::Book),
            authors: self.entities.count(EntityKind::Author),
            publishers: self.entities.count(EntityKind::Publisher),
            translators: self.entities.count(EntityKind::Translator),
            series: self.entities.count(EntityKind::Series),
            relations: self.relations.len(),
        }
    }
}

// ============================================================================
// Raw input records
// ============================================================================

/// One raw tabular book record, as handed over by the ingestion boundary.
///
/// Every field is optional; the builder treats empty strings and stringified
/// missing-value tokens as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBookRecord {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub translator: Option<String>,
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
}
