//! Part-of-speech assignment for extracted terms.
//!
//! Tagging is a curated-table lookup with two deterministic fallbacks: a
//! Title-Case token in running text tags as a proper noun, anything else as
//! a common noun. The tag vocabulary mirrors the feature-relevant subset of
//! a full tagset; everything the extractors should ignore collapses into
//! [`PosTag::Other`].

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::token::Token;

/// Part-of-speech tags the mining pipeline distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PosTag {
    CommonNoun,
    PersonalName,
    PlaceName,
    OrgName,
    /// Proper noun not recognizable as person/place/organization.
    ProperNoun,
    NominalVerb,
    NominalAdjective,
    Idiom,
    SetPhrase,
    Other,
}

impl PosTag {
    /// The extraction allow-list: nominal tags both weighting passes accept.
    pub fn is_nominal(self) -> bool {
        !matches!(self, PosTag::Other)
    }

    /// Proper-noun subtypes (named entities).
    pub fn is_proper(self) -> bool {
        matches!(
            self,
            PosTag::PersonalName | PosTag::PlaceName | PosTag::OrgName | PosTag::ProperNoun
        )
    }
}

/// Small curated sets with specific tags. The classifier's curated
/// vocabularies live in [`crate::vocab`]; these only refine tagging.
const NOMINAL_VERBS: &[&str] = &[
    "awakening", "reckoning", "uprising", "becoming", "longing", "yearning", "haunting",
    "unraveling", "retelling",
];

const NOMINAL_ADJECTIVES: &[&str] = &[
    "darkness", "loneliness", "madness", "cruelty", "innocence", "beauty", "vastness",
    "strangeness", "emptiness",
];

const IDIOMS: &[&str] = &["page-turner", "tour-de-force", "coming-of-age", "slow-burn"];

const SET_PHRASES: &[&str] = &["world-building", "cliff-hanger", "anti-hero", "mind-bending"];

/// Closed-class words no weighting pass should ever score.
const FUNCTION_WORDS: &[&str] = &[
    "the", "and", "but", "very", "really", "quite", "just", "also", "then", "than", "too",
    "however", "because", "about", "would", "could", "should", "though", "while", "where",
    "when", "what", "which", "who", "how", "why",
];

/// Word → tag table plus heuristic fallbacks.
#[derive(Debug, Default)]
pub struct Lexicon {
    overrides: AHashMap<String, PosTag>,
}

impl Lexicon {
    pub fn new() -> Self {
        let mut overrides = AHashMap::new();
        for w in NOMINAL_VERBS {
            overrides.insert((*w).to_string(), PosTag::NominalVerb);
        }
        for w in NOMINAL_ADJECTIVES {
            overrides.insert((*w).to_string(), PosTag::NominalAdjective);
        }
        for w in IDIOMS {
            overrides.insert((*w).to_string(), PosTag::Idiom);
        }
        for w in SET_PHRASES {
            overrides.insert((*w).to_string(), PosTag::SetPhrase);
        }
        for w in FUNCTION_WORDS {
            overrides.insert((*w).to_string(), PosTag::Other);
        }
        Self { overrides }
    }

    /// Register or override a tagged word (tests, domain extensions).
    pub fn insert(&mut self, word: &str, tag: PosTag) {
        self.overrides.insert(word.to_lowercase(), tag);
    }

    /// Tag a token. Curated table first, then casing evidence, then the
    /// common-noun default.
    pub fn tag(&self, token: &Token) -> PosTag {
        if let Some(tag) = self.overrides.get(&token.text) {
            return *tag;
        }
        if token.titlecase {
            return PosTag::ProperNoun;
        }
        PosTag::CommonNoun
    }
}
