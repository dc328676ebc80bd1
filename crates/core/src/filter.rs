use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::lexicon::Lexicon;

static NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9.,:;()\-\s]+$").unwrap());

static ROMAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^M{0,4}(CM|CD|D?C{0,3})(XC|XL|L?X{0,3})(IX|IV|V?I{0,3})$").unwrap()
});

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-zA-Z]{2,}").unwrap());

/// Why a reassembled phrase cannot be a heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    Empty,
    TooManyWords,
    Numeric,
    RomanNumeral,
    NoWord,
    UnlikelyWord,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Empty => write!(f, "empty"),
            Rejection::TooManyWords => write!(f, "too many words"),
            Rejection::Numeric => write!(f, "numeric"),
            Rejection::RomanNumeral => write!(f, "roman numeral"),
            Rejection::NoWord => write!(f, "no word"),
            Rejection::UnlikelyWord => write!(f, "unlikely single word"),
        }
    }
}

/// Structural and lexical checks applied to every reassembled phrase.
///
/// Checks run in order and the first failure is reported.  Single-word
/// phrases must also pass [`Lexicon::is_likely_heading_word`].
pub fn check_phrase(text: &str, lexicon: &Lexicon, max_words: usize) -> Result<(), Rejection> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Rejection::Empty);
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > max_words {
        return Err(Rejection::TooManyWords);
    }
    if NUMERIC.is_match(text) {
        return Err(Rejection::Numeric);
    }
    if ROMAN.is_match(&text.to_uppercase()) {
        return Err(Rejection::RomanNumeral);
    }
    if !words.iter().any(|w| WORD.is_match(w)) {
        return Err(Rejection::NoWord);
    }
    if let [word] = words.as_slice() {
        if !lexicon.is_likely_heading_word(word) {
            return Err(Rejection::UnlikelyWord);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(text: &str) -> Result<(), Rejection> {
        check_phrase(text, &Lexicon::builtin(), 9)
    }

    #[test]
    fn test_accepts_multi_word_phrases() {
        assert_eq!(check("Getting Started"), Ok(()));
        assert_eq!(check("1.2 Scope of work"), Ok(()));
        assert_eq!(check("the end of it"), Ok(()));
    }

    #[test]
    fn test_rejects_blank() {
        assert_eq!(check(""), Err(Rejection::Empty));
        assert_eq!(check("  \t "), Err(Rejection::Empty));
    }

    #[test]
    fn test_rejects_numbers() {
        for text in ["12", "3.1", "(4)", "1 - 2", "10:30"] {
            assert_eq!(check(text), Err(Rejection::Numeric), "{text}");
        }
    }

    #[test]
    fn test_rejects_roman_numerals_in_any_case() {
        for text in ["IV", "xii", "MCMXC", "v"] {
            assert_eq!(check(text), Err(Rejection::RomanNumeral), "{text}");
        }
    }

    #[test]
    fn test_rejects_phrases_without_a_real_word() {
        assert_eq!(check("A. 1"), Err(Rejection::NoWord));
        assert_eq!(check("§ 4 b"), Err(Rejection::NoWord));
    }

    #[test]
    fn test_rejects_long_phrases() {
        let long = "one two three four five six seven eight nine ten";
        assert_eq!(check(long), Err(Rejection::TooManyWords));
    }

    #[test]
    fn test_single_words_go_through_the_lexicon() {
        assert_eq!(check("the"), Err(Rejection::UnlikelyWord));
        assert_eq!(check("Introduction"), Ok(()));
        assert_eq!(check("summary"), Ok(()));
        assert_eq!(check("Acme"), Ok(()));
        assert_eq!(check("acme"), Err(Rejection::UnlikelyWord));
    }

    #[test]
    fn test_single_word_section_label() {
        // Mixed labels still need two consecutive letters somewhere.
        assert_eq!(check("3A"), Err(Rejection::NoWord));
        assert_eq!(check("2nd"), Ok(()));
        assert_eq!(check("sec4a"), Ok(()));
    }
}
