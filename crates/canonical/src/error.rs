use thiserror::Error;

/// Errors raised while validating a normalization configuration.
///
/// Normalization itself never fails; only a malformed [`NormalizeConfig`]
/// is rejected.
///
/// [`NormalizeConfig`]: crate::NormalizeConfig
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CanonicalError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("extra stop-word {word:?} is not in normalized form")]
    UnnormalizedStopWord { word: String },
}
