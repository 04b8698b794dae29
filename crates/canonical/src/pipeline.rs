use std::borrow::Cow;

use unicode_categories::UnicodeCategories;
use unicode_normalization::UnicodeNormalization;

use crate::config::NormalizeConfig;
use crate::lexicon::is_stop_word;
use crate::markup::strip_markup;
use crate::stem::stem;
use crate::whitespace::collapse_whitespace;

/// Normalizes `text` with the default configuration.
///
/// See [`normalize_with`] for the individual steps.
pub fn normalize(text: &str) -> String {
    normalize_with(text, &NormalizeConfig::default())
}

/// Normalizes `text` into a space-separated stream of stemmed tokens.
///
/// Steps, each applied to the whole text before the next:
///
/// 1. NFKC composition (when `normalize_unicode`)
/// 2. `<...>` tags replaced by a space (when `strip_markup`)
/// 3. whitespace collapsed, then lowercased
/// 4. every char that is neither a letter nor whitespace replaced by a
///    space, whitespace collapsed again
/// 5. stop-words and tokens shorter than `min_token_chars` dropped
/// 6. suffix stripping (when `stemming`)
///
/// Returns an empty string when no token survives. The function is pure and
/// never fails; `cfg` is expected to have passed
/// [`NormalizeConfig::validate`].
///
/// ```rust
/// use canonical::normalize;
///
/// assert_eq!(normalize("<p>Привет <b>мир</b>!</p>"), "прив мир");
/// assert_eq!(normalize("   "), "");
/// ```
pub fn normalize_with(text: &str, cfg: &NormalizeConfig) -> String {
    let composed: Cow<str> = if cfg.normalize_unicode {
        Cow::Owned(text.nfkc().collect())
    } else {
        Cow::Borrowed(text)
    };

    let unmarked: Cow<str> = if cfg.strip_markup {
        strip_markup(&composed)
    } else {
        Cow::Borrowed(composed.as_ref())
    };

    let lowered = collapse_whitespace(&unmarked).to_lowercase();
    let letters_only: String = lowered
        .chars()
        .map(|ch| {
            if ch.is_letter() || ch.is_whitespace() {
                ch
            } else {
                ' '
            }
        })
        .collect();

    let mut normalized = String::with_capacity(letters_only.len());
    for token in letters_only.split_whitespace() {
        if !keep_token(token, cfg) {
            continue;
        }
        let token = if cfg.stemming {
            stem(token, cfg.min_stem_chars)
        } else {
            token
        };
        if !normalized.is_empty() {
            normalized.push(' ');
        }
        normalized.push_str(token);
    }
    normalized
}

fn keep_token(token: &str, cfg: &NormalizeConfig) -> bool {
    if token.chars().count() < cfg.min_token_chars {
        return false;
    }
    if is_stop_word(token) {
        return false;
    }
    !cfg.extra_stop_words.iter().any(|word| word == token)
}
