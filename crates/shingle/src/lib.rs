//! # shinglecheck shingling
//!
//! Turns normalized text into overlapping word n-grams ("shingles") and
//! hashes each one into a 128-bit fingerprint. Fingerprints are the keys
//! the store and matcher use to find overlapping documents.
//!
//! ## Contract
//!
//! - Input is normalized text (space-separated tokens). No normalization
//!   happens here.
//! - Output is a pure function of `(normalized_text, config)`: no I/O, no
//!   clocks, no global state.
//! - Shingle spans are char offsets into the normalized text and always
//!   satisfy `start < end`.
//!
//! ## Example
//!
//! ```
//! use shingle::{fingerprint, ShingleConfig};
//!
//! let cfg = ShingleConfig::default().with_n(3);
//! let shingles = fingerprint("быстр коричнев лиса прыга забор", &cfg).unwrap();
//!
//! assert_eq!(shingles.len(), 3);
//! assert_eq!(shingles[0].text, "быстр коричнев лиса");
//! assert_eq!(shingles[0].hash.len(), 32);
//! ```
pub mod config;
mod fingerprint;
mod shingles;

pub use crate::config::{ShingleConfig, ShingleError};
pub use crate::fingerprint::{assemble, fingerprint, hash_shingle, Shingle};
pub use crate::shingles::make_shingles;

/// Normalizes raw text and fingerprints the result in one call.
#[cfg(feature = "with_canonical")]
pub fn fingerprint_text(
    raw: &str,
    normalize: &canonical::NormalizeConfig,
    cfg: &ShingleConfig,
) -> Result<Vec<Shingle>, ShingleError> {
    let normalized = canonical::normalize_with(raw, normalize);
    fingerprint(&normalized, cfg)
}
