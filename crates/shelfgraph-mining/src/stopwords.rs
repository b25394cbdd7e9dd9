//! Stopword set for comment mining.
//!
//! The embedded default covers structural English plus the review-generic
//! vocabulary that is common in reader comments but carries no feature
//! signal ("book", "author", "recommend", ...). A deployment can extend the
//! set from a one-word-per-line file.

use ahash::AHashSet;
use std::io::BufRead;
use std::path::Path;

use tracing::info;

const DEFAULT_STOPWORDS: &[&str] = &[
    // Structural
    "a", "an", "and", "are", "as", "at", "be", "been", "but", "by", "for", "from", "had",
    "has", "have", "he", "her", "his", "i", "if", "in", "is", "it", "its", "me", "my", "no",
    "not", "of", "on", "or", "our", "she", "so", "that", "the", "their", "them", "they",
    "this", "to", "was", "we", "were", "with", "you", "your", "will", "would", "there",
    "what", "when", "which", "who", "all", "also", "am", "any", "can", "do", "did", "does",
    "just", "more", "most", "much", "one", "only", "other", "out", "over", "some", "than",
    "then", "too", "up", "very", "really", "quite", "about", "into", "after", "before",
    // Review-generic: common in comments, featureless
    "book", "books", "novel", "author", "writer", "story", "stories", "chapter", "page",
    "pages", "read", "reads", "reading", "reader", "write", "writes", "writing", "written",
    "like", "liked", "love", "loved", "good", "great", "best", "better", "bad", "nice",
    "recommend", "recommended", "worth", "think", "thought", "feel", "felt", "know", "knew",
    "time", "times", "thing", "things", "way", "lot", "bit", "people", "end", "ending",
    "start", "beginning", "part", "review", "stars", "finish", "finished",
];

/// An extendable stopword set.
#[derive(Debug, Clone)]
pub struct Stopwords {
    words: AHashSet<String>,
}

impl Default for Stopwords {
    fn default() -> Self {
        Self {
            words: DEFAULT_STOPWORDS.iter().map(|w| (*w).to_string()).collect(),
        }
    }
}

impl Stopwords {
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn insert(&mut self, word: &str) {
        self.words.insert(word.to_lowercase());
    }

    /// Extend from a file, one word per line; blank lines and `#` comments
    /// are skipped.
    pub fn extend_from_file(&mut self, path: &Path) -> std::io::Result<()> {
        let file = std::fs::File::open(path)?;
        let before = self.words.len();
        for line in std::io::BufReader::new(file).lines() {
            let line = line?;
            let word = line.trim();
            if word.is_empty() || word.starts_with('#') {
                continue;
            }
            self.words.insert(word.to_lowercase());
        }
        info!(
            path = %path.display(),
            added = self.words.len() - before,
            total = self.words.len(),
            "extended stopword set"
        );
        Ok(())
    }
}
