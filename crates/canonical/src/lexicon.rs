//! Static stop-word and suffix tables.
//!
//! Both tables are built once on first use and never mutated. The defaults
//! target Russian prose; callers extend the stop-word set through
//! [`NormalizeConfig::extra_stop_words`](crate::NormalizeConfig).

use fxhash::FxHashSet;
use once_cell::sync::Lazy;

const STOP_WORDS: &[&str] = &[
    "и", "в", "на", "с", "по", "для", "от", "до", "из", "к", "о", "об", "что", "как", "так",
    "но", "а", "или", "же", "бы", "ли", "не", "ни", "то", "это", "этот", "эта", "эти", "тот",
    "та", "те", "он", "она", "оно", "они", "мы", "вы", "я", "ты", "его", "её", "их", "наш",
    "ваш", "мой", "твой", "свой", "который", "которая", "которое", "которые", "где", "когда",
    "почему", "зачем", "куда", "откуда", "сколько", "чем", "чего", "кого", "кому", "кем",
    "чему", "чём", "при", "под", "над", "за", "перед", "между", "через", "без", "против",
    "вместо", "кроме", "после", "во", "со", "ко",
];

/// Suffixes tried in order; the first one that fits wins.
pub(crate) const SUFFIXES: &[&str] = &[
    "ость", "ение", "ание", "ние", "ие", "ые", "ий", "ая", "ое", "ем", "ам", "ах", "ми", "ов",
    "ев", "ей", "ой", "ый", "ее", "ет", "ит", "ут", "ют", "ал", "ил", "ел", "ла", "ло", "ли",
];

static STOP_WORD_SET: Lazy<FxHashSet<&'static str>> =
    Lazy::new(|| STOP_WORDS.iter().copied().collect());

/// Returns `true` when `word` is in the built-in stop-word table.
///
/// The lookup is exact; callers pass already lowercased tokens.
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORD_SET.contains(word)
}
