//! Whitespace normalization.
//!
//! Whitespace follows Unicode's definition, so tabs, newlines, carriage
//! returns and no-break spaces all count as separators.

/// Collapses runs of whitespace to a single ASCII space and trims both ends.
///
/// Newlines are treated like any other whitespace, so paragraph structure
/// is lost. Paragraph counts must be taken from the original text.
///
/// ```rust
/// use canonical::collapse_whitespace;
///
/// assert_eq!(collapse_whitespace("  один\n\n два\t три "), "один два три");
/// assert_eq!(collapse_whitespace("hello\u{00A0}world"), "hello world");
/// assert_eq!(collapse_whitespace("   \n\t "), "");
/// ```
pub fn collapse_whitespace(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    for segment in text.split_whitespace() {
        if !normalized.is_empty() {
            normalized.push(' ');
        }
        normalized.push_str(segment);
    }
    normalized
}
