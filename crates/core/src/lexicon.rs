//! Word lists that decide whether a lone word can be a heading.
//!
//! Multi-word phrases that survive the structural checks are taken at face
//! value, but single words are a frequent source of false positives (a stray
//! bold "the", a page label).  The built-in lists ship as data in
//! `data/lexicon.toml` and can be extended or replaced at run time.

use std::collections::{BTreeSet, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const BUILTIN_SOURCE: &str = include_str!("../data/lexicon.toml");

static BUILTIN: Lazy<Lexicon> = Lazy::new(|| {
    Lexicon::from_toml(BUILTIN_SOURCE).expect("embedded lexicon.toml must be valid")
});

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w]").unwrap());

/// Lowercase `word` and strip everything that is not a word character.
pub fn normalize_word(word: &str) -> String {
    NON_WORD.replace_all(&word.trim().to_lowercase(), "").into_owned()
}

/// `true` when the text has at least one cased letter and no lowercase ones.
pub fn is_all_uppercase(text: &str) -> bool {
    text.chars().any(|c| c.is_uppercase()) && !text.chars().any(|c| c.is_lowercase())
}

/// On-disk shape of a lexicon file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct LexiconFile {
    likely: Vec<String>,
    unlikely: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lexicon {
    likely: HashSet<String>,
    unlikely: HashSet<String>,
}

impl Lexicon {
    pub fn new<L, U>(likely: L, unlikely: U) -> Self
    where
        L: IntoIterator,
        L::Item: AsRef<str>,
        U: IntoIterator,
        U::Item: AsRef<str>,
    {
        let mut lexicon = Lexicon::default();
        lexicon.extend(likely, unlikely);
        lexicon
    }

    /// The word lists bundled with the crate.
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let file: LexiconFile = toml::from_str(source)?;
        Ok(Lexicon::new(file.likely, file.unlikely))
    }

    /// Serialize with both lists sorted, suitable as a starting point for a
    /// custom lexicon.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let sorted = |set: &HashSet<String>| {
            set.iter()
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect::<Vec<_>>()
        };
        let file = LexiconFile {
            likely: sorted(&self.likely),
            unlikely: sorted(&self.unlikely),
        };
        Ok(toml::to_string_pretty(&file)?)
    }

    /// Add words to both lists. Words are stored normalized.
    pub fn extend<L, U>(&mut self, likely: L, unlikely: U)
    where
        L: IntoIterator,
        L::Item: AsRef<str>,
        U: IntoIterator,
        U::Item: AsRef<str>,
    {
        self.likely.extend(
            likely
                .into_iter()
                .map(|w| normalize_word(w.as_ref()))
                .filter(|w| !w.is_empty()),
        );
        self.unlikely.extend(
            unlikely
                .into_iter()
                .map(|w| normalize_word(w.as_ref()))
                .filter(|w| !w.is_empty()),
        );
    }

    pub fn is_likely(&self, normalized: &str) -> bool {
        self.likely.contains(normalized)
    }

    pub fn is_unlikely(&self, normalized: &str) -> bool {
        self.unlikely.contains(normalized)
    }

    pub fn sizes(&self) -> (usize, usize) {
        (self.likely.len(), self.unlikely.len())
    }

    /// Decide whether a phrase made of the single word `word` can be a
    /// heading.
    ///
    /// Listed words win: `unlikely` rejects, then `likely` accepts.  Unlisted
    /// words pass when they look like a proper noun (capitalized, 4+ chars),
    /// an acronym (all caps, 3+ chars) or a section label mixing letters and
    /// digits such as `3A`.
    pub fn is_likely_heading_word(&self, word: &str) -> bool {
        let normalized = normalize_word(word);

        if self.is_unlikely(&normalized) {
            return false;
        }
        if self.is_likely(&normalized) {
            return true;
        }

        let len = normalized.chars().count();
        let word = word.trim();

        if len >= 4 && word.chars().next().is_some_and(char::is_uppercase) {
            return true;
        }
        if len >= 3 && is_all_uppercase(word) {
            return true;
        }

        let has_digit = normalized.chars().any(|c| c.is_ascii_digit());
        let has_letter = normalized.chars().any(|c| c.is_ascii_alphabetic());
        has_digit && has_letter
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LexiconMode {
    /// Add the configured words to the built-in lists.
    #[default]
    Extend,
    /// Use only the configured words.
    Replace,
}

/// The `[lexicon]` section of an [`OutlineConfig`](crate::config::OutlineConfig).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    pub mode: LexiconMode,
    pub likely: Vec<String>,
    pub unlikely: Vec<String>,
}

impl LexiconConfig {
    pub fn apply(&self, base: Lexicon) -> Lexicon {
        let mut lexicon = match self.mode {
            LexiconMode::Extend => base,
            LexiconMode::Replace => Lexicon::default(),
        };
        lexicon.extend(&self.likely, &self.unlikely);
        lexicon
    }
}
