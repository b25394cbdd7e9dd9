//! The feature-keyword gate.
//!
//! A pure decision function standing between raw statistical term noise and
//! a book's public keyword profile. The rules apply in a fixed order with
//! first match winning; the length and weight floors short-circuit before
//! any tag reasoning.

use crate::lexicon::PosTag;
use crate::vocab::in_curated_vocab;

/// Minimum characters for a term to carry topical signal at all.
const MIN_WORD_CHARS: usize = 2;
/// Extraction-confidence floor.
const MIN_WEIGHT: f64 = 0.01;
/// A generic common noun needs this much weight to pass on confidence alone.
const HIGH_CONFIDENCE_WEIGHT: f64 = 0.05;

/// Decide whether an extracted term is a genuine book-feature keyword.
pub fn is_feature_keyword(word: &str, weight: f64, tag: PosTag) -> bool {
    let chars = word.chars().count();

    // 1. Single characters carry no topical signal.
    if chars < MIN_WORD_CHARS {
        return false;
    }
    // 2. Below the extraction-confidence floor.
    if weight < MIN_WEIGHT {
        return false;
    }
    // 3. Curated thematic vocabularies are always in.
    if in_curated_vocab(word) {
        return true;
    }
    // 4. Feature-bearing tag and substantial length.
    if tag.is_nominal() && chars >= 3 {
        return true;
    }
    // 5. Named entities are always informative, whatever their length.
    if tag.is_proper() {
        return true;
    }
    // 6. Idioms and set phrases likewise.
    if matches!(tag, PosTag::Idiom | PosTag::SetPhrase) {
        return true;
    }
    // 7. A high-confidence generic noun still counts.
    if tag == PosTag::CommonNoun && weight > HIGH_CONFIDENCE_WEIGHT && chars >= 2 {
        return true;
    }

    false
}
