//! Configuration and error types for shingling.
//!
//! The shingle pipeline is a pure function of `(normalized_text, config)`.
//! Two configs with the same `n` and `seed` produce bit-identical hashes on
//! every machine, which is what lets fingerprints written by one process be
//! matched by another.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for [`fingerprint`](crate::fingerprint).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ShingleConfig {
    /// Configuration schema version.
    ///
    /// Any change that can affect hashes must bump this version.
    pub version: u32,
    /// Number of tokens per shingle.
    ///
    /// Larger values make matches more specific and less tolerant to small
    /// edits.
    pub n: usize,
    /// Seed for the shingle hash. Changing it invalidates every stored
    /// fingerprint.
    pub seed: u64,
    /// Hash shingles on the rayon thread pool.
    pub use_parallel: bool,
}

impl ShingleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shingle size.
    pub fn with_n(mut self, n: usize) -> Self {
        self.n = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enable or disable parallel hashing. Only pays off for long documents.
    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ShingleError> {
        if self.n < 1 {
            return Err(ShingleError::InvalidConfigN { n: self.n });
        }
        if self.version < 1 {
            return Err(ShingleError::InvalidConfigVersion {
                version: self.version,
            });
        }
        Ok(())
    }
}

impl Default for ShingleConfig {
    fn default() -> Self {
        Self {
            version: 1,
            n: 4,
            seed: 0,
            use_parallel: false,
        }
    }
}

/// Errors returned by the shingle pipeline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShingleError {
    #[error("invalid config: n must be >= 1 (got {n})")]
    InvalidConfigN { n: usize },

    #[error("invalid config version {version}; expected >= 1")]
    InvalidConfigVersion { version: u32 },

    #[error("shingle parts differ in length: {texts} texts, {hashes} hashes, {spans} spans")]
    LengthMismatch {
        texts: usize,
        hashes: usize,
        spans: usize,
    },

    #[error("shingle {index} has an empty span [{start}, {end})")]
    InvalidSpan {
        index: usize,
        start: usize,
        end: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let cfg = ShingleConfig::default();
        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.n, 4);
        assert_eq!(cfg.seed, 0);
        assert!(!cfg.use_parallel);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn builder_methods() {
        let cfg = ShingleConfig::new()
            .with_n(3)
            .with_seed(42)
            .with_parallel(true);
        assert_eq!(cfg.n, 3);
        assert_eq!(cfg.seed, 42);
        assert!(cfg.use_parallel);
    }

    #[test]
    fn validate_rejects_zero_n() {
        let cfg = ShingleConfig::new().with_n(0);
        assert_eq!(cfg.validate(), Err(ShingleError::InvalidConfigN { n: 0 }));
    }

    #[test]
    fn validate_rejects_zero_version() {
        let cfg = ShingleConfig {
            version: 0,
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ShingleError::InvalidConfigVersion { version: 0 })
        );
    }

    #[test]
    fn error_messages() {
        let err = ShingleError::LengthMismatch {
            texts: 3,
            hashes: 2,
            spans: 3,
        };
        assert_eq!(
            err.to_string(),
            "shingle parts differ in length: 3 texts, 2 hashes, 3 spans"
        );
    }
}
