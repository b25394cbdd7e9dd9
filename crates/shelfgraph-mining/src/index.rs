//! The mined keyword index and its whole-corpus cache blob.
//!
//! One aggregate artifact holds everything the scorer needs: per-book
//! ranked keywords and weights, the global keyword set, the inverted
//! keyword → books index, per-book engagement stats, and popularity.
//! Invalidation is wholesale — delete the file, re-mine.

use ahash::AHashMap;
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use shelfgraph_kg::{load_blob, save_blob, EntityId, StoreError};

/// Engagement statistics for one book's comments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentStats {
    pub total_comments: usize,
    /// Comments rated 4 or 5.
    pub like_count: usize,
    pub like_ratio: f64,
    pub avg_rating: f64,
    /// Top-10 keyword slice for quick display.
    pub top_keywords: Vec<String>,
}

/// The mined profile of one book; immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookKeywordRecord {
    pub book_id: EntityId,
    /// Ranked by descending merged weight, deduplicated.
    pub keywords: Vec<String>,
    pub weights: AHashMap<String, f64>,
    pub stats: CommentStats,
    pub popularity: f64,
}

/// Whole-corpus keyword index, persisted as a single cache blob.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordIndex {
    pub book_keywords: AHashMap<EntityId, Vec<String>>,
    pub book_weights: AHashMap<EntityId, AHashMap<String, f64>>,
    pub all_keywords: BTreeSet<String>,
    /// keyword -> bitmap of book ids carrying it as a feature keyword.
    pub inverted: AHashMap<String, RoaringBitmap>,
    pub stats: AHashMap<EntityId, CommentStats>,
    pub popularity: AHashMap<EntityId, f64>,
}

impl KeywordIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of books with a mined profile.
    pub fn len(&self) -> usize {
        self.book_keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.book_keywords.is_empty()
    }

    /// Fold one mined record in.
    pub fn insert(&mut self, record: BookKeywordRecord) {
        for keyword in &record.keywords {
            self.all_keywords.insert(keyword.clone());
            self.inverted
                .entry(keyword.clone())
                .or_default()
                .insert(record.book_id);
        }
        self.book_weights.insert(record.book_id, record.weights);
        self.stats.insert(record.book_id, record.stats);
        self.popularity.insert(record.book_id, record.popularity);
        self.book_keywords.insert(record.book_id, record.keywords);
    }

    /// Books carrying a keyword, via the inverted index.
    pub fn books_with_keyword(&self, keyword: &str) -> impl Iterator<Item = EntityId> + '_ {
        self.inverted
            .get(keyword)
            .into_iter()
            .flat_map(|bm| bm.iter())
    }

    pub fn keywords_of(&self, book: EntityId) -> &[String] {
        self.book_keywords
            .get(&book)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn weights_of(&self, book: EntityId) -> Option<&AHashMap<String, f64>> {
        self.book_weights.get(&book)
    }

    pub fn stats_of(&self, book: EntityId) -> Option<&CommentStats> {
        self.stats.get(&book)
    }

    pub fn popularity_of(&self, book: EntityId) -> f64 {
        self.popularity.get(&book).copied().unwrap_or(0.0)
    }
}

/// Persist the whole index as one cache blob.
pub fn save_cache(index: &KeywordIndex, path: &Path) -> Result<(), StoreError> {
    save_blob(index, path)
}

/// Load the cache blob. Any failure is a typed error the pipeline treats as
/// a cache miss.
pub fn load_cache(path: &Path) -> Result<KeywordIndex, StoreError> {
    load_blob(path)
}
