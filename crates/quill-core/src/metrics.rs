#![forbid(unsafe_code)]

//! Word and character counts for the status bar.

use unicode_segmentation::UnicodeSegmentation;

/// Counts derived from the plain text of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocumentMetrics {
    /// Whitespace-separated tokens. Blank text has zero words.
    pub words: usize,
    /// User-perceived characters (extended grapheme clusters).
    pub characters: usize,
}

impl DocumentMetrics {
    /// Measure a plain-text string.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self {
            words: text.split_whitespace().count(),
            characters: text.graphemes(true).count(),
        }
    }
}

impl std::fmt::Display for DocumentMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Words: {} | Characters: {}", self.words, self.characters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn blank_text_has_no_words() {
        assert_eq!(DocumentMetrics::from_text("").words, 0);
        assert_eq!(DocumentMetrics::from_text("   \n\t ").words, 0);
    }

    #[test]
    fn counts_words_and_characters() {
        let m = DocumentMetrics::from_text("  Hello   brave\nnew world ");
        assert_eq!(m.words, 4);
        assert_eq!(m.characters, 26);
    }

    #[test]
    fn combining_marks_count_once() {
        // "e" + combining acute accent
        let m = DocumentMetrics::from_text("caf\u{0065}\u{0301}");
        assert_eq!(m.characters, 4);
        assert_eq!(m.words, 1);
    }

    #[test]
    fn display_matches_status_bar() {
        let m = DocumentMetrics::from_text("one two");
        assert_eq!(m.to_string(), "Words: 2 | Characters: 7");
    }

    proptest! {
        #[test]
        fn words_never_exceed_characters(text in "[a-zA-Z0-9 \\t\\néüß]{0,64}") {
            let m = DocumentMetrics::from_text(&text);
            prop_assert!(m.words <= m.characters);
        }

        #[test]
        fn ascii_characters_equal_length(text in "[a-z \n]{0,64}") {
            let m = DocumentMetrics::from_text(&text);
            prop_assert_eq!(m.characters, text.len());
        }
    }
}
