//! shinglecheck text normalization layer.
//!
//! Turns raw document text into a deterministic stream of stemmed tokens.
//! Downstream stages (shingling, fingerprint store, matcher) rely on this
//! output being identical for identical input, so two documents that differ
//! only in markup, casing, punctuation or inflection end up with the same
//! fingerprints.
//!
//! ## What we do
//!
//! - Unicode NFKC composition (configurable)
//! - Markup tag stripping
//! - Whitespace collapsing and Unicode-aware lowercasing
//! - Punctuation and digit removal (anything that is not a letter)
//! - Stop-word and short-token filtering
//! - Suffix-stripping stemming
//!
//! ## Pure function guarantee
//!
//! No I/O, no clock calls, no locale dependence. The stop-word and suffix
//! tables are static and built once.
//!
//! ```rust
//! use canonical::{normalize, normalize_with, NormalizeConfig};
//!
//! assert_eq!(normalize("Быстрая коричневая лиса!"), "быстр коричнев лиса");
//!
//! let cfg = NormalizeConfig::default().with_stemming(false);
//! assert_eq!(normalize_with("Быстрая лиса", &cfg), "быстрая лиса");
//! ```

mod config;
mod error;
mod lexicon;
mod markup;
mod pipeline;
mod stem;
mod whitespace;

pub use crate::config::NormalizeConfig;
pub use crate::error::CanonicalError;
pub use crate::lexicon::is_stop_word;
pub use crate::markup::strip_markup;
pub use crate::pipeline::{normalize, normalize_with};
pub use crate::stem::stem;
pub use crate::whitespace::collapse_whitespace;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_is_stripped_and_lowercased() {
        let out = normalize("<p>Привет <b>мир</b>!</p>");
        assert!(!out.contains('<'));
        assert!(!out.contains('>'));
        assert_eq!(out, out.to_lowercase());
        assert_eq!(out, "прив мир");
    }

    #[test]
    fn sentence_with_stop_words() {
        let out = normalize("Быстрая коричневая лиса прыгает через забор.");
        assert_eq!(out, "быстр коричнев лиса прыга забор");
    }

    #[test]
    fn empty_and_whitespace_only_inputs() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("  \n\t  "), "");
        assert_eq!(normalize("и в на с по"), "");
        assert_eq!(normalize("!!! ... 123"), "");
    }

    #[test]
    fn normalized_text_is_fixed_point() {
        let once = normalize("Быстр, ЛИСА и <i>забор</i>.");
        assert_eq!(once, "быстр лиса забор");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn latin_text_is_supported() {
        assert_eq!(normalize("The QUICK brown-fox!"), "the quick brown fox");
    }

    #[test]
    fn output_is_deterministic() {
        let text = "Программирование на языке Rust: быстро, надёжно.";
        assert_eq!(normalize(text), normalize(text));
    }
}
