//! The parallel comment-mining pipeline.
//!
//! Per book: select comment text (high-rating preferred), run both
//! weighting passes over the shared part-of-speech allow-list, merge at
//! 0.8× centrality, filter through stopwords + the feature classifier,
//! rank, and attach engagement stats. Books are independent, so the map
//! runs on a rayon pool sized to `available_parallelism - 1`; results fold
//! into the [`KeywordIndex`] only after the parallel phase completes.
//!
//! The whole merged output caches as one blob; an unreadable cache is a
//! miss (re-mine), never a fatal error.

use ahash::{AHashMap, AHashSet};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use tracing::{debug, info, warn};

use shelfgraph_kg::EntityId;

use crate::classifier::is_feature_keyword;
use crate::index::{save_cache, load_cache, BookKeywordRecord, CommentStats, KeywordIndex};
use crate::lexicon::{Lexicon, PosTag};
use crate::stopwords::Stopwords;
use crate::textrank;
use crate::tfidf::{self, IdfTable};
use crate::token::{has_digit, is_all_punctuation, tokenize};

/// A comment rated this or higher counts as an endorsement.
pub const HIGH_RATING: u8 = 4;

/// One raw comment row, as handed over by the ingestion boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCommentRecord {
    #[serde(default)]
    pub book_url: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    /// Star rating 0-5; an absent rating counts as 0.
    #[serde(default)]
    pub rating: Option<u8>,
}

impl RawCommentRecord {
    fn rating_score(&self) -> u8 {
        self.rating.unwrap_or(0).min(5)
    }
}

/// Pipeline tuning knobs, one table.
#[derive(Debug, Clone)]
pub struct MiningConfig {
    /// Top terms kept from the statistical pass.
    pub statistical_top_k: usize,
    /// Top terms kept from the centrality pass.
    pub centrality_top_k: usize,
    /// Centrality contribution factor when merging the two passes.
    pub centrality_factor: f64,
    /// Worker threads; defaults to `available_parallelism - 1`.
    pub workers: Option<usize>,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            statistical_top_k: 50,
            centrality_top_k: 40,
            centrality_factor: 0.8,
            workers: None,
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}

/// Candidate token stream for one document: the allow-list both weighting
/// passes share, plus each term's leading part-of-speech tag.
fn candidate_terms(
    text: &str,
    lexicon: &Lexicon,
    stopwords: &Stopwords,
) -> (Vec<String>, AHashMap<String, PosTag>) {
    let mut terms = Vec::new();
    let mut tags: AHashMap<String, PosTag> = AHashMap::new();
    for token in tokenize(text) {
        if token.text.chars().count() < 2 || stopwords.contains(&token.text) {
            continue;
        }
        let tag = lexicon.tag(&token);
        if !tag.is_nominal() {
            continue;
        }
        // Leading tag: the first occurrence decides.
        tags.entry(token.text.clone()).or_insert(tag);
        terms.push(token.text);
    }
    (terms, tags)
}

/// Pre-extraction view of one book's comments.
struct BookDoc {
    book_id: EntityId,
    terms: Vec<String>,
    tags: AHashMap<String, PosTag>,
    distinct: AHashSet<String>,
    total_comments: usize,
    like_count: usize,
    rating_sum: u64,
}

fn prepare_book(
    book_id: EntityId,
    comments: &[&RawCommentRecord],
    lexicon: &Lexicon,
    stopwords: &Stopwords,
) -> Option<BookDoc> {
    let mut high: Vec<&str> = Vec::new();
    let mut all: Vec<&str> = Vec::new();
    let mut like_count = 0usize;
    let mut rating_sum = 0u64;

    for comment in comments {
        rating_sum += u64::from(comment.rating_score());
        let liked = comment.rating_score() >= HIGH_RATING;
        if liked {
            like_count += 1;
        }
        if let Some(text) = comment.text.as_deref().filter(|t| !t.is_empty()) {
            all.push(text);
            if liked {
                high.push(text);
            }
        }
    }

    // No usable text at all: absence, not an error.
    if all.is_empty() {
        return None;
    }

    let selected = if high.is_empty() { &all } else { &high };
    let text = selected.join(" ");
    let (terms, tags) = candidate_terms(&text, lexicon, stopwords);
    let distinct: AHashSet<String> = terms.iter().cloned().collect();

    Some(BookDoc {
        book_id,
        terms,
        tags,
        distinct,
        total_comments: comments.len(),
        like_count,
        rating_sum,
    })
}

fn extract_book(
    doc: &BookDoc,
    idf: &IdfTable,
    stopwords: &Stopwords,
    config: &MiningConfig,
) -> BookKeywordRecord {
    let statistical = tfidf::extract(&doc.terms, idf, config.statistical_top_k);
    let centrality = textrank::extract(&doc.terms, config.centrality_top_k);

    let mut merged: AHashMap<String, f64> = AHashMap::new();
    for (term, weight) in statistical {
        *merged.entry(term).or_insert(0.0) += weight;
    }
    for (term, weight) in centrality {
        *merged.entry(term).or_insert(0.0) += weight * config.centrality_factor;
    }

    let mut kept: Vec<(String, f64)> = merged
        .into_iter()
        .filter(|(term, weight)| {
            if term.chars().count() < 2 || stopwords.contains(term) {
                return false;
            }
            if has_digit(term) || is_all_punctuation(term) {
                return false;
            }
            let tag = doc.tags.get(term).copied().unwrap_or(PosTag::CommonNoun);
            is_feature_keyword(term, *weight, tag)
        })
        .collect();
    kept.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let keywords: Vec<String> = kept.iter().map(|(term, _)| term.clone()).collect();
    let weights: AHashMap<String, f64> = kept.into_iter().collect();

    let total = doc.total_comments;
    let like_ratio = if total > 0 {
        doc.like_count as f64 / total as f64
    } else {
        0.0
    };
    let avg_rating = if total > 0 {
        doc.rating_sum as f64 / total as f64
    } else {
        0.0
    };
    let popularity = (1.0 + total as f64).ln() * (1.0 + like_ratio);

    let stats = CommentStats {
        total_comments: total,
        like_count: doc.like_count,
        like_ratio,
        avg_rating,
        top_keywords: keywords.iter().take(10).cloned().collect(),
    };

    BookKeywordRecord {
        book_id: doc.book_id,
        keywords,
        weights,
        stats,
        popularity,
    }
}

/// Mine the whole corpus: group comments per book, extract in parallel,
/// fold into the keyword index.
pub fn mine_keywords(
    comments: &[RawCommentRecord],
    url_to_book: &AHashMap<String, EntityId>,
    stopwords: &Stopwords,
    config: &MiningConfig,
) -> KeywordIndex {
    let mut grouped: AHashMap<EntityId, Vec<&RawCommentRecord>> = AHashMap::new();
    let mut unmapped = 0usize;
    for comment in comments {
        let Some(url) = comment.book_url.as_deref().filter(|u| !u.is_empty()) else {
            continue;
        };
        match url_to_book.get(url) {
            Some(&book_id) => grouped.entry(book_id).or_default().push(comment),
            None => unmapped += 1,
        }
    }
    if unmapped > 0 {
        debug!(unmapped, "comments referencing unknown books skipped");
    }

    let lexicon = Lexicon::new();
    let workers = config.workers.unwrap_or_else(default_workers);
    info!(
        books = grouped.len(),
        comments = comments.len(),
        workers,
        "mining comment keywords"
    );

    let groups: Vec<(EntityId, Vec<&RawCommentRecord>)> = grouped.into_iter().collect();

    let run = || {
        // Pass 1: per-book candidate streams (parallel, pure).
        let docs: Vec<BookDoc> = groups
            .par_iter()
            .filter_map(|(book_id, comments)| {
                prepare_book(*book_id, comments, &lexicon, stopwords)
            })
            .collect();

        // Corpus document frequencies, shared read-only with the workers.
        let idf = IdfTable::from_documents(docs.iter().map(|d| &d.distinct));

        // Pass 2: extraction (parallel, pure). A single failing book yields
        // no record and never aborts the batch.
        docs.par_iter()
            .filter_map(|doc| {
                match catch_unwind(AssertUnwindSafe(|| {
                    extract_book(doc, &idf, stopwords, config)
                })) {
                    Ok(record) => Some(record),
                    Err(_) => {
                        warn!(book_id = doc.book_id, "keyword extraction failed, book skipped");
                        None
                    }
                }
            })
            .collect::<Vec<BookKeywordRecord>>()
    };

    let records = match rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
    {
        Ok(pool) => pool.install(run),
        Err(err) => {
            warn!(error = %err, "worker pool unavailable, mining on the global pool");
            run()
        }
    };

    // Fold only after the parallel phase completes.
    let mut index = KeywordIndex::new();
    for record in records {
        index.insert(record);
    }
    info!(
        books = index.len(),
        keywords = index.all_keywords.len(),
        "keyword mining complete"
    );
    index
}

/// Cache-aware entry point: use the cache blob when it loads, otherwise
/// (missing or unreadable) mine from scratch and persist the fresh result.
pub fn mine_or_load(
    cache_path: &Path,
    comments: &[RawCommentRecord],
    url_to_book: &AHashMap<String, EntityId>,
    stopwords: &Stopwords,
    config: &MiningConfig,
) -> anyhow::Result<KeywordIndex> {
    if cache_path.exists() {
        match load_cache(cache_path) {
            Ok(index) => {
                info!(
                    path = %cache_path.display(),
                    books = index.len(),
                    "loaded keyword cache"
                );
                return Ok(index);
            }
            Err(err) => {
                warn!(
                    path = %cache_path.display(),
                    error = %err,
                    "keyword cache unreadable, re-mining"
                );
            }
        }
    }

    let index = mine_keywords(comments, url_to_book, stopwords, config);
    save_cache(&index, cache_path)?;
    info!(path = %cache_path.display(), "keyword cache written");
    Ok(index)
}
