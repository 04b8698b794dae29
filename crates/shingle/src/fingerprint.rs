//! Shingle representation and hashing.
//!
//! The hash is part of the persisted contract: stores and matchers compare
//! hashes produced by different processes, so the algorithm (xxh3-128,
//! lowercase hex) must only change together with a config version bump.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_128_with_seed;

use crate::config::{ShingleConfig, ShingleError};
use crate::shingles::windows;

/// One hashed shingle and its char span in the normalized text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Shingle {
    pub text: String,
    /// 32 lowercase hex chars.
    pub hash: String,
    pub start: usize,
    pub end: usize,
}

/// Hashes a shingle into 32 lowercase hex characters.
///
/// ```rust
/// use shingle::hash_shingle;
///
/// let h = hash_shingle("быстр коричнев лиса прыга", 0);
/// assert_eq!(h.len(), 32);
/// assert_eq!(h, hash_shingle("быстр коричнев лиса прыга", 0));
/// assert_ne!(h, hash_shingle("быстр коричнев лиса прыга", 1));
/// ```
pub fn hash_shingle(text: &str, seed: u64) -> String {
    format!("{:032x}", xxh3_128_with_seed(text.as_bytes(), seed))
}

/// Zips shingle texts, hashes and spans into [`Shingle`]s.
///
/// Fails when the three inputs differ in length or a span is empty.
pub fn assemble(
    texts: Vec<String>,
    hashes: Vec<String>,
    spans: Vec<(usize, usize)>,
) -> Result<Vec<Shingle>, ShingleError> {
    if texts.len() != hashes.len() || texts.len() != spans.len() {
        return Err(ShingleError::LengthMismatch {
            texts: texts.len(),
            hashes: hashes.len(),
            spans: spans.len(),
        });
    }

    texts
        .into_iter()
        .zip(hashes)
        .zip(spans)
        .enumerate()
        .map(|(index, ((text, hash), (start, end)))| {
            if start >= end {
                return Err(ShingleError::InvalidSpan { index, start, end });
            }
            Ok(Shingle {
                text,
                hash,
                start,
                end,
            })
        })
        .collect()
}

/// Fingerprints normalized text into hashed shingles, in text order.
///
/// Empty input yields an empty list.
pub fn fingerprint(normalized: &str, cfg: &ShingleConfig) -> Result<Vec<Shingle>, ShingleError> {
    cfg.validate()?;

    let windows = windows(normalized, cfg.n);
    let hashes: Vec<String> = if cfg.use_parallel {
        windows
            .par_iter()
            .map(|w| hash_shingle(&w.text, cfg.seed))
            .collect()
    } else {
        windows
            .iter()
            .map(|w| hash_shingle(&w.text, cfg.seed))
            .collect()
    };

    let mut texts = Vec::with_capacity(windows.len());
    let mut spans = Vec::with_capacity(windows.len());
    for w in windows {
        spans.push((w.start, w.end));
        texts.push(w.text);
    }
    assemble(texts, hashes, spans)
}
