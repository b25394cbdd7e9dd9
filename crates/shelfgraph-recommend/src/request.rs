//! Typed request parameters.
//!
//! The serving boundary validates and parses once into these enums; the
//! scorer never sees a raw string it has to interpret.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use shelfgraph_kg::EntityKind;

use crate::weights::ScoringWeights;

/// Signal-mix mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Graph relations + keywords, keywords at half weight.
    Mixed,
    /// Graph relations only.
    KgOnly,
    /// Keyword overlap only.
    KeywordOnly,
}

impl Strategy {
    pub fn uses_keywords(self) -> bool {
        matches!(self, Strategy::Mixed | Strategy::KeywordOnly)
    }

    pub fn uses_graph(self) -> bool {
        matches!(self, Strategy::Mixed | Strategy::KgOnly)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Mixed => "mixed",
            Strategy::KgOnly => "kg_only",
            Strategy::KeywordOnly => "keyword_only",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mixed" => Ok(Strategy::Mixed),
            "kg_only" => Ok(Strategy::KgOnly),
            "keyword_only" => Ok(Strategy::KeywordOnly),
            other => Err(format!(
                "unknown strategy '{other}' (expected mixed, kg_only or keyword_only)"
            )),
        }
    }
}

/// The graph-relation classes a request may enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Series,
    Author,
    Translator,
    Publisher,
}

impl RelationKind {
    /// Canonical evaluation order.
    pub const ALL: [RelationKind; 4] = [
        RelationKind::Series,
        RelationKind::Author,
        RelationKind::Translator,
        RelationKind::Publisher,
    ];

    /// The neighbor entity kind this relation reaches.
    pub fn entity_kind(self) -> EntityKind {
        match self {
            RelationKind::Series => EntityKind::Series,
            RelationKind::Author => EntityKind::Author,
            RelationKind::Translator => EntityKind::Translator,
            RelationKind::Publisher => EntityKind::Publisher,
        }
    }

    pub fn weight(self, weights: &ScoringWeights) -> f64 {
        match self {
            RelationKind::Series => weights.series,
            RelationKind::Author => weights.author,
            RelationKind::Translator => weights.translator,
            RelationKind::Publisher => weights.publisher,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::Series => "series",
            RelationKind::Author => "author",
            RelationKind::Translator => "translator",
            RelationKind::Publisher => "publisher",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "series" => Ok(RelationKind::Series),
            "author" => Ok(RelationKind::Author),
            "translator" => Ok(RelationKind::Translator),
            "publisher" => Ok(RelationKind::Publisher),
            other => Err(format!(
                "unknown relation kind '{other}' (expected series, author, translator or publisher)"
            )),
        }
    }
}

/// One recommendation request; stateless, pre-validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendRequest {
    /// Favorite book names to seed from.
    pub favorites: Vec<String>,
    /// Maximum results returned.
    pub top_k: usize,
    pub strategy: Strategy,
    /// Enabled relation kinds; `None` means all four.
    #[serde(default)]
    pub relations: Option<Vec<RelationKind>>,
    /// Restrict the preference map to exactly these keywords; `None` means
    /// use everything the favorites carry.
    #[serde(default)]
    pub selected_keywords: Option<Vec<String>>,
}

impl RecommendRequest {
    pub fn new(favorites: Vec<String>, top_k: usize, strategy: Strategy) -> Self {
        Self {
            favorites,
            top_k,
            strategy,
            relations: None,
            selected_keywords: None,
        }
    }

    /// Enabled relations in canonical order.
    pub fn enabled_relations(&self) -> Vec<RelationKind> {
        match &self.relations {
            None => RelationKind::ALL.to_vec(),
            Some(set) => RelationKind::ALL
                .into_iter()
                .filter(|k| set.contains(k))
                .collect(),
        }
    }
}
