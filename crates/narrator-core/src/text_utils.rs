//! Text splitting helpers for TTS alignment.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Candidates at or below this many characters (after trimming) are dropped.
pub const MIN_SENTENCE_CHARS: usize = 10;

/// Words must be longer than this to count toward fragment matching.
const MIN_SIGNIFICANT_WORD_CHARS: usize = 2;

static RE_SENTENCE_TERMINATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").unwrap());

/// Split text on runs of terminal punctuation, keeping only candidates longer
/// than [`MIN_SENTENCE_CHARS`]. The punctuation itself is discarded.
pub fn split_sentences(text: &str) -> Vec<String> {
    RE_SENTENCE_TERMINATORS
        .split(text)
        .map(str::trim)
        .filter(|candidate| candidate.chars().count() > MIN_SENTENCE_CHARS)
        .map(str::to_string)
        .collect()
}

/// Number of sentences [`split_sentences`] would produce, without allocating them.
pub fn count_sentences(text: &str) -> usize {
    RE_SENTENCE_TERMINATORS
        .split(text)
        .filter(|candidate| candidate.trim().chars().count() > MIN_SENTENCE_CHARS)
        .count()
}

/// Lowercased, compatibility-normalized form used for fuzzy matching.
///
/// PDF extraction commonly emits ligature glyphs (`ﬁ`, `ﬂ`); NFKC folds them
/// back to plain letters so they match the sentence text.
pub fn match_form(text: &str) -> String {
    text.nfkc().collect::<String>().to_lowercase()
}

/// Lowercase whitespace-separated tokens longer than two characters.
pub fn significant_words(sentence: &str) -> Vec<String> {
    match_form(sentence.trim())
        .split_whitespace()
        .filter(|word| word.chars().count() > MIN_SIGNIFICANT_WORD_CHARS)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_short_candidates_and_punctuation() {
        let sentences = split_sentences(
            "Hello world. This is a test sentence! Short. Another proper sentence here?",
        );
        assert_eq!(
            sentences,
            vec![
                "Hello world".to_string(),
                "This is a test sentence".to_string(),
                "Another proper sentence here".to_string()
            ]
        );
    }

    #[test]
    fn ten_characters_is_not_enough() {
        assert_eq!(split_sentences("Exactly 10. Eleven char."), vec!["Eleven char".to_string()]);
        assert_eq!(split_sentences("  Exactly 10  !"), Vec::<String>::new());
    }

    #[test]
    fn repeated_terminators_split_once() {
        let sentences = split_sentences("Wait for it... Something happened here?!? Indeed it did.");
        assert_eq!(
            sentences,
            vec![
                "Wait for it".to_string(),
                "Something happened here".to_string(),
                "Indeed it did".to_string()
            ]
        );
        assert_eq!(count_sentences("Wait for it... Something happened here?!?"), 2);
    }

    #[test]
    fn whitespace_only_text_has_no_sentences() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   \n\t ").is_empty());
        assert_eq!(count_sentences("  "), 0);
    }

    #[test]
    fn trailing_text_without_terminator_is_kept() {
        let sentences = split_sentences("The first full sentence. And a dangling tail");
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[1], "And a dangling tail");
    }

    #[test]
    fn significant_words_skip_short_tokens() {
        let words = significant_words("  The cat is on a Mat today ");
        assert_eq!(words, vec!["the", "cat", "mat", "today"]);
    }

    #[test]
    fn ligatures_fold_for_matching() {
        assert_eq!(match_form("The ﬁrst Field"), "the first field");
    }
}
