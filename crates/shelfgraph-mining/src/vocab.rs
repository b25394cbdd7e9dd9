//! Curated thematic vocabularies.
//!
//! Five closed vocabularies of terms that are always genuine book-feature
//! signals, maintained as static configuration. Membership short-circuits
//! the classifier ahead of any part-of-speech reasoning.

/// Genre / theme terms.
pub const THEME_TERMS: &[&str] = &[
    "science-fiction",
    "scifi",
    "fantasy",
    "romance",
    "mystery",
    "thriller",
    "horror",
    "historical",
    "adventure",
    "dystopia",
    "utopia",
    "noir",
    "western",
    "steampunk",
    "cyberpunk",
    "satire",
    "memoir",
    "biography",
    "philosophy",
    "psychology",
    "wuxia",
    "spy",
    "war",
    "crime",
    "gothic",
];

/// Plot-element terms.
pub const PLOT_TERMS: &[&str] = &[
    "betrayal",
    "redemption",
    "revenge",
    "conspiracy",
    "sacrifice",
    "survival",
    "quest",
    "rebellion",
    "mystery",
    "secret",
    "truth",
    "destiny",
    "escape",
    "heist",
    "twist",
    "tragedy",
    "romance",
    "journey",
    "awakening",
    "downfall",
];

/// Character-role terms.
pub const CHARACTER_TERMS: &[&str] = &[
    "protagonist",
    "antagonist",
    "hero",
    "heroine",
    "villain",
    "antihero",
    "mentor",
    "sidekick",
    "narrator",
    "detective",
    "orphan",
    "outcast",
    "genius",
    "tyrant",
    "rebel",
    "wanderer",
];

/// Stylistic-descriptor terms.
pub const STYLE_TERMS: &[&str] = &[
    "humorous",
    "witty",
    "poetic",
    "lyrical",
    "bleak",
    "gritty",
    "tender",
    "haunting",
    "suspenseful",
    "atmospheric",
    "whimsical",
    "melancholy",
    "sardonic",
    "sparse",
    "baroque",
    "cinematic",
    "unreliable",
    "experimental",
];

/// World-building terms.
pub const WORLD_TERMS: &[&str] = &[
    "civilization",
    "empire",
    "kingdom",
    "dynasty",
    "galaxy",
    "universe",
    "planet",
    "colony",
    "wasteland",
    "underworld",
    "multiverse",
    "realm",
    "frontier",
    "utopia",
    "apocalypse",
    "mythology",
    "pantheon",
];

/// Membership in any of the five curated vocabularies.
pub fn in_curated_vocab(word: &str) -> bool {
    THEME_TERMS.contains(&word)
        || PLOT_TERMS.contains(&word)
        || CHARACTER_TERMS.contains(&word)
        || STYLE_TERMS.contains(&word)
        || WORLD_TERMS.contains(&word)
}
