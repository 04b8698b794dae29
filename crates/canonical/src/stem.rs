use crate::lexicon::SUFFIXES;

/// Strips the first matching suffix from `word` when the remaining stem
/// keeps at least `min_stem_chars` characters.
///
/// Lengths are counted in `char`s. Words without a qualifying suffix are
/// returned unchanged.
///
/// ```rust
/// use canonical::stem;
///
/// assert_eq!(stem("быстрая", 3), "быстр");
/// assert_eq!(stem("привет", 3), "прив");
/// assert_eq!(stem("мир", 3), "мир");
/// ```
pub fn stem(word: &str, min_stem_chars: usize) -> &str {
    let word_chars = word.chars().count();
    for suffix in SUFFIXES {
        if !word.ends_with(suffix) {
            continue;
        }
        let suffix_chars = suffix.chars().count();
        if word_chars >= suffix_chars + min_stem_chars {
            return &word[..word.len() - suffix.len()];
        }
    }
    word
}
