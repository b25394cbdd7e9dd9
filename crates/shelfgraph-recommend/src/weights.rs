//! The scoring configuration table.
//!
//! Every tunable constant of the engine lives here rather than inline at
//! its use site; this is the tuning surface of the whole recommender.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Per-relation contribution for a shared neighbor.
    pub series: f64,
    pub author: f64,
    pub translator: f64,
    pub publisher: f64,

    /// Keyword contributions are halved when blended with graph relations.
    pub mixed_keyword_factor: f64,
    /// How many preference keywords (by aggregated weight) generate
    /// candidates.
    pub preference_keyword_limit: usize,
    /// Weight granted to a user-selected keyword absent from the favorites'
    /// own profiles.
    pub default_selected_weight: f64,

    /// Rating boost: `(rating / rating_scale) * rating_factor`.
    pub rating_factor: f64,
    pub rating_scale: f64,
    /// Ratings at or above this earn their own reason line.
    pub rating_reason_threshold: f64,

    pub popularity_factor: f64,

    /// Like-ratio reason: ratio above this with more than
    /// `like_ratio_min_comments` comments.
    pub like_ratio_threshold: f64,
    pub like_ratio_min_comments: usize,
    /// Comment-volume reason threshold.
    pub hot_comments_threshold: usize,
    /// Average-reader-rating reason threshold (5-point scale).
    pub high_avg_rating: f64,

    /// Matched keywords needed before a synthesized keyword-match reason.
    pub min_matched_for_reason: usize,
    /// Reasons kept per recommendation after dedup.
    pub max_reasons: usize,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            series: 0.4,
            author: 0.3,
            translator: 0.2,
            publisher: 0.15,

            mixed_keyword_factor: 0.5,
            preference_keyword_limit: 50,
            default_selected_weight: 0.5,

            rating_factor: 0.15,
            rating_scale: 10.0,
            rating_reason_threshold: 8.5,

            popularity_factor: 0.05,

            like_ratio_threshold: 0.7,
            like_ratio_min_comments: 50,
            hot_comments_threshold: 500,
            high_avg_rating: 4.0,

            min_matched_for_reason: 3,
            max_reasons: 5,
        }
    }
}
