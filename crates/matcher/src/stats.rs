use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::TextStatistics;

static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+").expect("static sentence pattern"));

/// Computes paragraph, word, character and sentence counts of the original
/// text.
///
/// - characters are Unicode scalar values
/// - words are whitespace-delimited
/// - paragraphs are separated by a blank line (`\r\n` counts as `\n`); a
///   blank text has none
/// - sentences are the segments between runs of `.`, `!` or `?`, minus the
///   trailing one
///
/// ```rust
/// use matcher::text_statistics;
///
/// let stats = text_statistics("Первый абзац. Второе предложение!\n\nВторой абзац.");
/// assert_eq!(stats.paragraph_count, 2);
/// assert_eq!(stats.sentence_count, 3);
/// assert_eq!(stats.word_count, 6);
/// ```
pub fn text_statistics(original: &str) -> TextStatistics {
    let unix = original.replace("\r\n", "\n");

    let paragraphs: Vec<&str> = unix.split("\n\n").collect();
    let paragraph_count = if paragraphs.len() == 1 && paragraphs[0].trim().is_empty() {
        0
    } else {
        paragraphs.len()
    };

    let sentence_count = SENTENCE_END.split(original).count().saturating_sub(1);

    TextStatistics {
        paragraph_count,
        word_count: original.split_whitespace().count(),
        character_count: original.chars().count(),
        sentence_count,
    }
}
