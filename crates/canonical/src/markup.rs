use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("static tag pattern"));

/// Replaces every `<...>` tag with a single space.
///
/// Text without tags is returned borrowed. An unterminated `<` is left as is
/// and later removed as punctuation by the normalizer.
///
/// ```rust
/// use canonical::strip_markup;
///
/// assert_eq!(strip_markup("<p>hi</p>"), " hi ");
/// assert_eq!(strip_markup("a < b"), "a < b");
/// ```
pub fn strip_markup(text: &str) -> Cow<'_, str> {
    TAG.replace_all(text, " ")
}
