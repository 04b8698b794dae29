//! Configuration types for the normalization pipeline.
//!
//! [`NormalizeConfig`] controls the optional parts of text normalization.
//! The defaults reproduce the reference behaviour used when fingerprints
//! were first written to the store, so changing any field on a live corpus
//! makes new fingerprints incomparable with stored ones.
//!
//! # Versioning
//!
//! Any change that can alter normalized output must bump `version`.
//! Fingerprint stores do not record the version per shingle, so the
//! version is the only way to tell two generations apart.
//!
//! # Examples
//!
//! ```rust
//! use canonical::NormalizeConfig;
//!
//! let config = NormalizeConfig::default();
//! assert_eq!(config.version, 1);
//! assert_eq!(config.min_token_chars, 3);
//! assert!(config.stemming);
//! ```

use serde::{Deserialize, Serialize};
use unicode_categories::UnicodeCategories;

use crate::error::CanonicalError;

/// Configuration for [`normalize_with`](crate::normalize_with).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Semantic version of the normalization behaviour. Must be >= 1.
    pub version: u32,

    /// Apply Unicode NFKC composition before anything else.
    ///
    /// Decomposed accents (`e` + U+0301) are combining marks, not letters,
    /// and would otherwise be replaced by a space when punctuation is
    /// stripped, splitting one word into two tokens.
    pub normalize_unicode: bool,

    /// Replace `<...>` tags with a single space.
    pub strip_markup: bool,

    /// Tokens with fewer characters than this are dropped together with
    /// stop-words.
    pub min_token_chars: usize,

    /// A suffix is only stripped when the remaining stem keeps at least
    /// this many characters.
    pub min_stem_chars: usize,

    /// Enable the suffix-stripping stemmer.
    pub stemming: bool,

    /// Additional stop-words, checked after the built-in table.
    ///
    /// Entries must already be lowercase letters only; anything else could
    /// never match a normalized token and is rejected by [`validate`].
    ///
    /// [`validate`]: NormalizeConfig::validate
    pub extra_stop_words: Vec<String>,
}

impl NormalizeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_token_chars(mut self, min_token_chars: usize) -> Self {
        self.min_token_chars = min_token_chars;
        self
    }

    pub fn with_stemming(mut self, stemming: bool) -> Self {
        self.stemming = stemming;
        self
    }

    pub fn with_extra_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_stop_words = words.into_iter().map(Into::into).collect();
        self
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), CanonicalError> {
        if self.version == 0 {
            return Err(CanonicalError::InvalidConfig(
                "config version must be >= 1".into(),
            ));
        }
        if self.min_stem_chars == 0 {
            return Err(CanonicalError::InvalidConfig(
                "min_stem_chars must be >= 1".into(),
            ));
        }
        for word in &self.extra_stop_words {
            let normalized = !word.is_empty()
                && word
                    .chars()
                    .all(|ch| ch.is_letter() && !ch.is_uppercase());
            if !normalized {
                return Err(CanonicalError::UnnormalizedStopWord { word: word.clone() });
            }
        }
        Ok(())
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            version: 1,
            normalize_unicode: true,
            strip_markup: true,
            min_token_chars: 3,
            min_stem_chars: 3,
            stemming: true,
            extra_stop_words: Vec::new(),
        }
    }
}
