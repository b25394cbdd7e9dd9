//! The recommendation scorer.
//!
//! Pure read of the loaded graph + keyword index; every invocation builds a
//! fresh candidate table and returns ranked, explained results. Ties in
//! score order break by ascending entity id so ranked output reproduces
//! exactly.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use shelfgraph_kg::{EntityId, KnowledgeGraph};
use shelfgraph_mining::{CommentStats, KeywordIndex};

use crate::request::{RecommendRequest, RelationKind};
use crate::weights::ScoringWeights;

/// One ranked, explained recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub book_id: EntityId,
    pub name: String,
    pub url: Option<String>,
    pub rating: Option<f32>,
    pub score: f64,
    /// Deduplicated contributing reasons, at most five.
    pub reasons: Vec<String>,
    /// The book's own public keyword slice.
    pub keywords: Vec<String>,
    /// Preference keywords that matched this book, at most ten.
    pub matched_keywords: Vec<String>,
    pub stats: Option<CommentStats>,
    pub explanation: String,
}

#[derive(Debug, Default)]
struct Candidate {
    score: f64,
    reasons: Vec<String>,
    matched_keywords: Vec<String>,
}

/// Per-book neighbor ids grouped by relation kind, cached at construction.
#[derive(Debug, Default, Clone)]
struct NeighborsByKind {
    series: Vec<EntityId>,
    author: Vec<EntityId>,
    translator: Vec<EntityId>,
    publisher: Vec<EntityId>,
}

impl NeighborsByKind {
    fn of(&self, kind: RelationKind) -> &[EntityId] {
        match kind {
            RelationKind::Series => &self.series,
            RelationKind::Author => &self.author,
            RelationKind::Translator => &self.translator,
            RelationKind::Publisher => &self.publisher,
        }
    }
}

/// The recommendation service object.
///
/// Owns shared read-only state; construct once at service start and inject
/// into request handlers.
pub struct Recommender {
    graph: Arc<KnowledgeGraph>,
    keywords: Arc<KeywordIndex>,
    weights: ScoringWeights,
    /// book id -> neighbors by kind
    neighbors: AHashMap<EntityId, NeighborsByKind>,
    book_ids: Vec<EntityId>,
}

impl Recommender {
    pub fn new(graph: Arc<KnowledgeGraph>, keywords: Arc<KeywordIndex>) -> Self {
        Self::with_weights(graph, keywords, ScoringWeights::default())
    }

    pub fn with_weights(
        graph: Arc<KnowledgeGraph>,
        keywords: Arc<KeywordIndex>,
        weights: ScoringWeights,
    ) -> Self {
        let book_ids = graph.book_ids();
        let neighbors = book_ids
            .iter()
            .map(|&book| {
                let by_kind = NeighborsByKind {
                    series: graph.neighbors_of_kind(book, RelationKind::Series.entity_kind()),
                    author: graph.neighbors_of_kind(book, RelationKind::Author.entity_kind()),
                    translator: graph
                        .neighbors_of_kind(book, RelationKind::Translator.entity_kind()),
                    publisher: graph
                        .neighbors_of_kind(book, RelationKind::Publisher.entity_kind()),
                };
                (book, by_kind)
            })
            .collect();
        info!(books = book_ids.len(), "recommender initialized");
        Self {
            graph,
            keywords,
            weights,
            neighbors,
            book_ids,
        }
    }

    pub fn graph(&self) -> &KnowledgeGraph {
        &self.graph
    }

    pub fn keyword_index(&self) -> &KeywordIndex {
        &self.keywords
    }

    /// Resolve favorite names to book entities. Unmatched names are logged
    /// and skipped, never an error.
    fn resolve_favorites(&self, names: &[String]) -> Vec<EntityId> {
        let mut out = Vec::new();
        for name in names {
            match self.graph.entities.find_book_by_name(name) {
                Some(id) => {
                    debug!(name = %name, book_id = id, "favorite resolved");
                    out.push(id);
                }
                None => warn!(name = %name, "favorite book not found, skipping"),
            }
        }
        out
    }

    /// Aggregate the favorites' keyword weights into a preference map,
    /// optionally restricted to user-selected keywords.
    fn preference_keywords(
        &self,
        favorites: &[EntityId],
        selected: Option<&[String]>,
    ) -> AHashMap<String, f64> {
        let mut preference: AHashMap<String, f64> = AHashMap::new();
        for &fav in favorites {
            if let Some(weights) = self.keywords.weights_of(fav) {
                for (keyword, weight) in weights {
                    *preference.entry(keyword.clone()).or_insert(0.0) += weight;
                }
            }
        }

        if let Some(selected) = selected {
            // A chosen keyword outside the favorites' own profile still
            // contributes, at the default weight.
            let mut restricted = AHashMap::new();
            for keyword in selected {
                let weight = preference
                    .get(keyword)
                    .copied()
                    .unwrap_or(self.weights.default_selected_weight);
                restricted.insert(keyword.clone(), weight);
            }
            preference = restricted;
        }

        preference
    }

    /// Run one recommendation request.
    pub fn recommend(&self, request: &RecommendRequest) -> Vec<Recommendation> {
        let relations = request.enabled_relations();
        info!(
            favorites = ?request.favorites,
            strategy = %request.strategy,
            top_k = request.top_k,
            "recommendation request"
        );

        let favorites = self.resolve_favorites(&request.favorites);
        if favorites.is_empty() {
            info!("no favorite resolved, returning empty result");
            return Vec::new();
        }
        let favorite_set: AHashSet<EntityId> = favorites.iter().copied().collect();

        let preference = if request.strategy.uses_keywords() {
            self.preference_keywords(&favorites, request.selected_keywords.as_deref())
        } else {
            AHashMap::new()
        };

        let mut candidates: AHashMap<EntityId, Candidate> = AHashMap::new();

        if request.strategy.uses_keywords() {
            self.score_keywords(&preference, &favorite_set, request, &mut candidates);
        }
        if request.strategy.uses_graph() {
            self.score_relations(&favorites, &favorite_set, &relations, &mut candidates);
        }
        self.apply_boosts(&preference, request, &mut candidates);

        // Rank: score descending, entity id ascending on ties.
        let mut ranked: Vec<(EntityId, Candidate)> = candidates.into_iter().collect();
        ranked.sort_by(|a, b| b.1.score.total_cmp(&a.1.score).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(request.top_k);

        let results: Vec<Recommendation> = ranked
            .into_iter()
            .map(|(book_id, candidate)| self.finish(book_id, candidate))
            .collect();
        info!(count = results.len(), "recommendation complete");
        results
    }

    /// Keyword signal: candidates via the inverted index over the top
    /// preference keywords.
    fn score_keywords(
        &self,
        preference: &AHashMap<String, f64>,
        favorite_set: &AHashSet<EntityId>,
        request: &RecommendRequest,
        candidates: &mut AHashMap<EntityId, Candidate>,
    ) {
        let factor = if request.strategy.uses_graph() {
            self.weights.mixed_keyword_factor
        } else {
            1.0
        };

        let mut top: Vec<(&String, &f64)> = preference.iter().collect();
        top.sort_by(|a, b| b.1.total_cmp(a.1).then_with(|| a.0.cmp(b.0)));
        top.truncate(self.weights.preference_keyword_limit);

        for (keyword, &weight) in top {
            for book in self.keywords.books_with_keyword(keyword) {
                if favorite_set.contains(&book) {
                    continue;
                }
                let candidate = candidates.entry(book).or_default();
                candidate.score += weight * factor;
                candidate.matched_keywords.push(keyword.clone());
            }
        }
    }

    /// Graph signal: shared-neighbor candidates over the enabled relation
    /// kinds. The reverse index is built here, only when this signal runs
    /// and only for enabled kinds.
    fn score_relations(
        &self,
        favorites: &[EntityId],
        favorite_set: &AHashSet<EntityId>,
        relations: &[RelationKind],
        candidates: &mut AHashMap<EntityId, Candidate>,
    ) {
        // neighbor entity -> books attached to it, per enabled kind
        let mut reverse: AHashMap<(RelationKind, EntityId), Vec<EntityId>> = AHashMap::new();
        for &book in &self.book_ids {
            let Some(neighbors) = self.neighbors.get(&book) else {
                continue;
            };
            for &kind in relations {
                for &neighbor in neighbors.of(kind) {
                    reverse.entry((kind, neighbor)).or_default().push(book);
                }
            }
        }

        for &fav in favorites {
            let fav_name = self.entity_name(fav);
            let Some(fav_neighbors) = self.neighbors.get(&fav) else {
                continue;
            };
            for &kind in relations {
                for &neighbor in fav_neighbors.of(kind) {
                    let neighbor_name = self.entity_name(neighbor);
                    let Some(books) = reverse.get(&(kind, neighbor)) else {
                        continue;
                    };
                    for &book in books {
                        if favorite_set.contains(&book) {
                            continue;
                        }
                        let candidate = candidates.entry(book).or_default();
                        candidate.score += kind.weight(&self.weights);
                        candidate.reasons.push(format!(
                            "shares {} «{}» with «{}»",
                            kind, neighbor_name, fav_name
                        ));
                    }
                }
            }
        }
    }

    /// Quality/popularity boost for already-scored candidates, plus the
    /// synthesized keyword-match reason. Never creates a candidate.
    fn apply_boosts(
        &self,
        preference: &AHashMap<String, f64>,
        request: &RecommendRequest,
        candidates: &mut AHashMap<EntityId, Candidate>,
    ) {
        for (&book, candidate) in candidates.iter_mut() {
            let rating = self
                .graph
                .entities
                .get(book)
                .and_then(|e| e.rating)
                .filter(|r| *r > 0.0);
            if let Some(rating) = rating {
                candidate.score +=
                    (f64::from(rating) / self.weights.rating_scale) * self.weights.rating_factor;
                if f64::from(rating) >= self.weights.rating_reason_threshold {
                    candidate
                        .reasons
                        .push(format!("highly rated ({rating:.1}/10)"));
                }
            }

            if let Some(stats) = self.keywords.stats_of(book) {
                candidate.score +=
                    self.keywords.popularity_of(book) * self.weights.popularity_factor;

                if stats.like_ratio > self.weights.like_ratio_threshold
                    && stats.total_comments > self.weights.like_ratio_min_comments
                {
                    candidate.reasons.push(format!(
                        "strong reader approval ({}/{} high-rating comments)",
                        stats.like_count, stats.total_comments
                    ));
                }
                if stats.total_comments > self.weights.hot_comments_threshold {
                    candidate.reasons.push(format!(
                        "widely discussed ({} comments)",
                        stats.total_comments
                    ));
                }
                if stats.avg_rating >= self.weights.high_avg_rating {
                    candidate.reasons.push(format!(
                        "high average reader rating ({:.1}/5)",
                        stats.avg_rating
                    ));
                }
            }

            if request.strategy.uses_keywords()
                && candidate.matched_keywords.len() >= self.weights.min_matched_for_reason
            {
                let meaningful: Vec<&String> = candidate
                    .matched_keywords
                    .iter()
                    .take(10)
                    .filter(|kw| preference.contains_key(*kw) && kw.chars().count() >= 2)
                    .collect();
                if meaningful.len() >= self.weights.min_matched_for_reason {
                    let listed: Vec<&str> =
                        meaningful.iter().take(5).map(|s| s.as_str()).collect();
                    let reason =
                        format!("comment keywords match your taste: {}", listed.join(", "));
                    if request.strategy.uses_graph() {
                        // Relation reasons take narrative priority in mixed
                        // mode.
                        candidate.reasons.push(reason);
                    } else {
                        candidate.reasons.insert(0, reason);
                    }
                }
            }
        }
    }

    fn finish(&self, book_id: EntityId, candidate: Candidate) -> Recommendation {
        let entity = self.graph.entities.get(book_id);
        let name = entity.map(|e| e.name.clone()).unwrap_or_default();
        let rating = entity.and_then(|e| e.rating);

        // Dedup reasons, first-seen order, then truncate.
        let mut seen: AHashSet<&String> = AHashSet::new();
        let mut reasons: Vec<String> = Vec::new();
        for reason in &candidate.reasons {
            if seen.insert(reason) {
                reasons.push(reason.clone());
            }
        }
        reasons.truncate(self.weights.max_reasons);

        let stats = self.keywords.stats_of(book_id).cloned();
        let keywords = stats
            .as_ref()
            .map(|s| s.top_keywords.clone())
            .unwrap_or_default();

        let mut matched_keywords = candidate.matched_keywords;
        matched_keywords.truncate(10);

        let explanation = build_explanation(&name, rating, &reasons);

        Recommendation {
            book_id,
            name,
            url: entity.and_then(|e| e.url.clone()),
            rating,
            score: candidate.score,
            reasons,
            keywords,
            matched_keywords,
            stats,
            explanation,
        }
    }

    fn entity_name(&self, id: EntityId) -> String {
        self.graph
            .entities
            .get(id)
            .map(|e| e.name.clone())
            .unwrap_or_default()
    }
}

fn build_explanation(name: &str, rating: Option<f32>, reasons: &[String]) -> String {
    if reasons.is_empty() {
        return format!("Recommending «{name}»: similar to the books you already enjoy");
    }
    let mut out = match rating {
        Some(r) => format!("Recommending «{name}» (rating: {r:.1}) because:"),
        None => format!("Recommending «{name}» because:"),
    };
    for (i, reason) in reasons.iter().enumerate() {
        out.push_str(&format!("\n{}. {}", i + 1, reason));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Strategy;
    use approx::assert_relative_eq;
    use shelfgraph_kg::{build_graph, RawBookRecord};
    use shelfgraph_mining::{BookKeywordRecord, CommentStats};

    fn book(url: &str, name: &str, author: &str) -> RawBookRecord {
        RawBookRecord {
            url: Some(url.to_string()),
            name: Some(name.to_string()),
            author: Some(author.to_string()),
            ..Default::default()
        }
    }

    /// Three books: A and B by author X, C by author Y. No ratings, no
    /// comment stats, so relation weights are the entire score.
    fn author_graph() -> Arc<KnowledgeGraph> {
        Arc::new(build_graph(&[
            book("u/a", "A", "X"),
            book("u/b", "B", "X"),
            book("u/c", "C", "Y"),
        ]))
    }

    fn keyword_record(book_id: EntityId, keywords: &[(&str, f64)]) -> BookKeywordRecord {
        BookKeywordRecord {
            book_id,
            keywords: keywords.iter().map(|(k, _)| (*k).to_string()).collect(),
            weights: keywords
                .iter()
                .map(|(k, w)| ((*k).to_string(), *w))
                .collect(),
            stats: CommentStats {
                total_comments: 4,
                like_count: 2,
                like_ratio: 0.5,
                avg_rating: 3.0,
                top_keywords: keywords.iter().map(|(k, _)| (*k).to_string()).collect(),
            },
            popularity: 0.0,
        }
    }

    fn request(favorites: &[&str], strategy: Strategy) -> RecommendRequest {
        RecommendRequest::new(
            favorites.iter().map(|s| (*s).to_string()).collect(),
            20,
            strategy,
        )
    }

    #[test]
    fn shared_author_scores_exactly_the_relation_weight() {
        let recommender = Recommender::new(author_graph(), Arc::new(KeywordIndex::new()));
        let mut req = request(&["A"], Strategy::KgOnly);
        req.relations = Some(vec![RelationKind::Author]);

        let results = recommender.recommend(&req);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "B");
        assert_relative_eq!(results[0].score, 0.3, max_relative = 1e-12);
        // C shares nothing with A and never appears.
        assert!(results.iter().all(|r| r.name != "C"));
    }

    #[test]
    fn favorites_are_never_candidates() {
        let recommender = Recommender::new(author_graph(), Arc::new(KeywordIndex::new()));
        let fav = recommender
            .graph()
            .entities
            .find_book_by_name("A")
            .unwrap();
        let results = recommender.recommend(&request(&["A"], Strategy::Mixed));
        assert!(results.iter().all(|r| r.book_id != fav));
    }

    #[test]
    fn unresolved_favorites_yield_empty_result() {
        let recommender = Recommender::new(author_graph(), Arc::new(KeywordIndex::new()));
        let results = recommender.recommend(&request(&["No Such Book"], Strategy::Mixed));
        assert!(results.is_empty());
    }

    #[test]
    fn kg_only_never_synthesizes_a_keyword_reason() {
        let mut index = KeywordIndex::new();
        index.insert(keyword_record(
            0,
            &[("dragon", 0.4), ("empire", 0.3), ("betrayal", 0.2), ("quest", 0.2)],
        ));
        index.insert(keyword_record(
            1,
            &[("dragon", 0.5), ("empire", 0.2), ("betrayal", 0.1), ("quest", 0.3)],
        ));
        let recommender = Recommender::new(author_graph(), Arc::new(index));

        let results = recommender.recommend(&request(&["A"], Strategy::KgOnly));
        assert!(!results.is_empty());
        for rec in &results {
            assert!(rec
                .reasons
                .iter()
                .all(|r| !r.starts_with("comment keywords match")));
            assert!(rec.matched_keywords.is_empty());
        }
    }

    #[test]
    fn keyword_only_never_produces_relation_reasons() {
        let mut index = KeywordIndex::new();
        index.insert(keyword_record(0, &[("dragon", 0.4)]));
        index.insert(keyword_record(2, &[("dragon", 0.6)]));
        let recommender = Recommender::new(author_graph(), Arc::new(index));

        let results = recommender.recommend(&request(&["A"], Strategy::KeywordOnly));
        assert!(!results.is_empty());
        for rec in &results {
            assert!(rec.reasons.iter().all(|r| !r.starts_with("shares ")));
        }
        // C (book id 2) is reachable by keyword even with a different
        // author.
        assert!(results.iter().any(|r| r.name == "C"));
    }

    #[test]
    fn keyword_only_puts_the_synthesized_reason_first() {
        // Favorite A and candidate B share four meaningful keywords.
        let shared: &[(&str, f64)] = &[
            ("dragon", 0.4),
            ("empire", 0.3),
            ("betrayal", 0.2),
            ("quest", 0.2),
        ];
        let mut index = KeywordIndex::new();
        index.insert(keyword_record(0, shared));
        index.insert(keyword_record(1, shared));
        let recommender = Recommender::new(author_graph(), Arc::new(index));

        let results = recommender.recommend(&request(&["A"], Strategy::KeywordOnly));
        let b = results.iter().find(|r| r.name == "B").unwrap();
        assert!(b.reasons[0].starts_with("comment keywords match your taste:"));
    }

    #[test]
    fn mixed_appends_the_synthesized_reason_after_relations() {
        let shared: &[(&str, f64)] = &[
            ("dragon", 0.4),
            ("empire", 0.3),
            ("betrayal", 0.2),
        ];
        let mut index = KeywordIndex::new();
        index.insert(keyword_record(0, shared));
        index.insert(keyword_record(1, shared));
        let recommender = Recommender::new(author_graph(), Arc::new(index));

        let results = recommender.recommend(&request(&["A"], Strategy::Mixed));
        let b = results.iter().find(|r| r.name == "B").unwrap();
        let kw_pos = b
            .reasons
            .iter()
            .position(|r| r.starts_with("comment keywords match"))
            .unwrap();
        let rel_pos = b
            .reasons
            .iter()
            .position(|r| r.starts_with("shares author"))
            .unwrap();
        assert!(rel_pos < kw_pos);
    }

    #[test]
    fn mixed_halves_keyword_contributions() {
        let mut index = KeywordIndex::new();
        index.insert(keyword_record(0, &[("dragon", 0.4)]));
        index.insert(keyword_record(2, &[("dragon", 0.8)]));
        let recommender = Recommender::new(author_graph(), Arc::new(index));

        let keyword_only = recommender.recommend(&request(&["A"], Strategy::KeywordOnly));
        let mixed = recommender.recommend(&request(&["A"], Strategy::Mixed));
        let full = keyword_only.iter().find(|r| r.name == "C").unwrap();
        let half = mixed.iter().find(|r| r.name == "C").unwrap();

        // C gets no relation score, so the mixed score is exactly half the
        // keyword-only score plus identical boosts (popularity 0 here).
        assert_relative_eq!(half.score, full.score * 0.5, max_relative = 1e-9);
    }

    #[test]
    fn selected_keywords_restrict_and_default_weight_applies() {
        let mut index = KeywordIndex::new();
        index.insert(keyword_record(0, &[("dragon", 0.4)]));
        // B carries a keyword A's profile lacks.
        index.insert(keyword_record(1, &[("wasteland", 0.9)]));
        let recommender = Recommender::new(author_graph(), Arc::new(index));

        let mut req = request(&["A"], Strategy::KeywordOnly);
        req.selected_keywords = Some(vec!["wasteland".to_string()]);
        let results = recommender.recommend(&req);

        let b = results.iter().find(|r| r.name == "B").unwrap();
        // Default weight 0.5 for a selected keyword outside the profile.
        assert_relative_eq!(b.score, 0.5, max_relative = 1e-12);
        assert_eq!(b.matched_keywords, vec!["wasteland".to_string()]);
    }

    #[test]
    fn rating_boost_and_reason() {
        let records = vec![
            book("u/a", "A", "X"),
            RawBookRecord {
                url: Some("u/b".into()),
                name: Some("B".into()),
                author: Some("X".into()),
                rating: Some(9.0),
                ..Default::default()
            },
        ];
        let graph = Arc::new(build_graph(&records));
        let recommender = Recommender::new(graph, Arc::new(KeywordIndex::new()));

        let mut req = request(&["A"], Strategy::KgOnly);
        req.relations = Some(vec![RelationKind::Author]);
        let results = recommender.recommend(&req);
        let b = &results[0];
        assert_relative_eq!(b.score, 0.3 + (9.0 / 10.0) * 0.15, max_relative = 1e-6);
        assert!(b.reasons.iter().any(|r| r.starts_with("highly rated")));
    }

    #[test]
    fn scores_tie_break_by_entity_id() {
        // B and C both share only the author with A -> equal scores.
        let graph = Arc::new(build_graph(&[
            book("u/a", "A", "X"),
            book("u/b", "B", "X"),
            book("u/c", "C", "X"),
        ]));
        let recommender = Recommender::new(graph, Arc::new(KeywordIndex::new()));
        let results = recommender.recommend(&request(&["A"], Strategy::KgOnly));
        assert_eq!(results.len(), 2);
        assert!(results[0].book_id < results[1].book_id);
    }

    #[test]
    fn top_k_truncates() {
        let graph = Arc::new(build_graph(&[
            book("u/a", "A", "X"),
            book("u/b", "B", "X"),
            book("u/c", "C", "X"),
            book("u/d", "D", "X"),
        ]));
        let recommender = Recommender::new(graph, Arc::new(KeywordIndex::new()));
        let mut req = request(&["A"], Strategy::KgOnly);
        req.top_k = 2;
        assert_eq!(recommender.recommend(&req).len(), 2);
    }

    #[test]
    fn explanation_lists_numbered_reasons() {
        let recommender = Recommender::new(author_graph(), Arc::new(KeywordIndex::new()));
        let results = recommender.recommend(&request(&["A"], Strategy::KgOnly));
        let b = &results[0];
        assert!(b.explanation.starts_with("Recommending «B»"));
        assert!(b.explanation.contains("because:"));
        assert!(b.explanation.contains("\n1. "));
    }

    #[test]
    fn zero_comment_book_reachable_by_graph_not_keywords() {
        // B has no keyword record at all.
        let mut index = KeywordIndex::new();
        index.insert(keyword_record(0, &[("dragon", 0.4)]));
        let recommender = Recommender::new(author_graph(), Arc::new(index));

        let by_keywords = recommender.recommend(&request(&["A"], Strategy::KeywordOnly));
        assert!(by_keywords.iter().all(|r| r.name != "B"));

        let by_graph = recommender.recommend(&request(&["A"], Strategy::KgOnly));
        assert!(by_graph.iter().any(|r| r.name == "B"));
    }
}
