//! Word n-gram shingling over normalized text.
//!
//! Both functions run in O(tokens * n) and never reorder tokens. Input is
//! expected to come from the normalizer; no further normalization happens
//! here.

/// A token window with its char span in the normalized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Window {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Splits `normalized` into overlapping windows of `n` tokens.
///
/// Fewer than `n` tokens yield a single shingle of all tokens; empty input
/// yields no shingles. `n == 0` is treated as `1`.
///
/// ```rust
/// use shingle::make_shingles;
///
/// assert_eq!(make_shingles("a b c", 2), vec!["a b", "b c"]);
/// assert_eq!(make_shingles("a b", 4), vec!["a b"]);
/// assert!(make_shingles("", 4).is_empty());
/// ```
pub fn make_shingles(normalized: &str, n: usize) -> Vec<String> {
    windows(normalized, n).into_iter().map(|w| w.text).collect()
}

pub(crate) fn windows(normalized: &str, n: usize) -> Vec<Window> {
    let tokens = token_spans(normalized);
    if tokens.is_empty() {
        return Vec::new();
    }
    let n = n.max(1).min(tokens.len());

    let mut out = Vec::with_capacity(tokens.len() - n + 1);
    for group in tokens.windows(n) {
        let mut text = String::new();
        for (idx, token) in group.iter().enumerate() {
            if idx > 0 {
                text.push(' ');
            }
            text.push_str(token.0);
        }
        // `group` is never empty because `n >= 1`.
        let start = group[0].1;
        let end = group[group.len() - 1].2;
        out.push(Window { text, start, end });
    }
    out
}

/// Tokens with their `[start, end)` char offsets.
fn token_spans(text: &str) -> Vec<(&str, usize, usize)> {
    let mut spans = Vec::new();
    let mut current: Option<(usize, usize)> = None; // (byte start, char start)
    let mut char_pos = 0usize;

    for (byte_idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if let Some((byte_start, char_start)) = current.take() {
                spans.push((&text[byte_start..byte_idx], char_start, char_pos));
            }
        } else if current.is_none() {
            current = Some((byte_idx, char_pos));
        }
        char_pos += 1;
    }
    if let Some((byte_start, char_start)) = current {
        spans.push((&text[byte_start..], char_start, char_pos));
    }
    spans
}
