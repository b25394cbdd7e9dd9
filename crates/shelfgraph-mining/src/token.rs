//! Deterministic comment tokenizer.
//!
//! Splits on non-alphanumeric characters and camelCase boundaries,
//! lowercases every token, and remembers whether the surface form was
//! written Title-Case so the lexicon can treat it as a name candidate.

/// A normalized token plus the casing evidence the lexicon needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Lowercased token text.
    pub text: String,
    /// The surface form was capitalized in running text (Title-Case word,
    /// not an all-caps shout).
    pub titlecase: bool,
}

const MAX_TOKEN_LEN: usize = 64;

/// Tokenize free text. No filtering happens here; length/stopword/tag
/// filters are the candidate stage's job.
pub fn tokenize(text: &str) -> Vec<Token> {
    #[derive(Default)]
    struct Scan {
        current: String,
        first_upper: bool,
        upper_count: usize,
        char_count: usize,
    }

    impl Scan {
        fn flush(&mut self, tokens: &mut Vec<Token>) {
            if !self.current.is_empty() {
                tokens.push(Token {
                    text: std::mem::take(&mut self.current),
                    titlecase: self.first_upper && self.upper_count == 1 && self.char_count > 1,
                });
            }
            self.first_upper = false;
            self.upper_count = 0;
            self.char_count = 0;
        }
    }

    let mut tokens = Vec::new();
    let mut scan = Scan::default();
    let mut prev_was_lower = false;

    for c in text.chars() {
        if c.is_alphanumeric() {
            // camelCase boundary: "SpaceOpera" -> "space" + "opera".
            if c.is_uppercase() && prev_was_lower && !scan.current.is_empty() {
                scan.flush(&mut tokens);
            }
            if scan.char_count < MAX_TOKEN_LEN {
                if c.is_uppercase() {
                    if scan.current.is_empty() {
                        scan.first_upper = true;
                    }
                    scan.upper_count += 1;
                }
                scan.char_count += 1;
                scan.current.extend(c.to_lowercase());
            }
            prev_was_lower = c.is_lowercase();
            continue;
        }
        scan.flush(&mut tokens);
        prev_was_lower = false;
    }
    scan.flush(&mut tokens);

    tokens
}

/// Any decimal digit anywhere in the term.
pub fn has_digit(term: &str) -> bool {
    term.chars().any(|c| c.is_ascii_digit())
}

/// Entirely punctuation (no alphanumeric character at all).
pub fn is_all_punctuation(term: &str) -> bool {
    !term.is_empty() && term.chars().all(|c| !c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn splits_on_punctuation_and_lowercases() {
        let tokens = tokenize("A gripping, dark story!");
        assert_eq!(texts(&tokens), vec!["a", "gripping", "dark", "story"]);
    }

    #[test]
    fn splits_camel_case() {
        let tokens = tokenize("pure SpaceOpera");
        assert_eq!(texts(&tokens), vec!["pure", "space", "opera"]);
    }

    #[test]
    fn records_titlecase_evidence() {
        let tokens = tokenize("met Gandalf in MORDOR today");
        let gandalf = tokens.iter().find(|t| t.text == "gandalf").unwrap();
        assert!(gandalf.titlecase);
        // All-caps is a shout, not a name signal.
        let mordor = tokens.iter().find(|t| t.text == "mordor").unwrap();
        assert!(!mordor.titlecase);
        let today = tokens.iter().find(|t| t.text == "today").unwrap();
        assert!(!today.titlecase);
    }

    #[test]
    fn digit_and_punctuation_helpers() {
        assert!(has_digit("catch22"));
        assert!(!has_digit("catch"));
        assert!(is_all_punctuation("--!?"));
        assert!(!is_all_punctuation("a-b"));
        assert!(!is_all_punctuation(""));
    }
}
