use std::time::Duration;

use canonical::CanonicalError;
use chrono::{DateTime, Utc};
use index::StoreError;
use serde::{Deserialize, Serialize};
use shingle::ShingleError;
use thiserror::Error;

/// Configuration for grouping store hits into per-document matches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatchConfig {
    /// Groups whose similarity is below this percentage are discarded. A group
    /// exactly at the threshold is kept.
    pub min_similarity_percent: f64,
    /// Prefix of the human-readable source label, followed by a space and the
    /// source document id.
    pub source_label_prefix: String,
}

impl MatchConfig {
    pub(crate) fn default_min_similarity_percent() -> f64 {
        5.0
    }

    pub fn with_min_similarity_percent(mut self, percent: f64) -> Self {
        self.min_similarity_percent = percent;
        self
    }

    pub fn with_source_label_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.source_label_prefix = prefix.into();
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), MatchError> {
        if !(0.0..=100.0).contains(&self.min_similarity_percent) {
            return Err(MatchError::InvalidConfig(
                "min_similarity_percent must be between 0.0 and 100.0".into(),
            ));
        }
        if self.source_label_prefix.trim().is_empty() {
            return Err(MatchError::InvalidConfig(
                "source_label_prefix must not be empty".into(),
            ));
        }
        Ok(())
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            min_similarity_percent: Self::default_min_similarity_percent(),
            source_label_prefix: "Document".to_string(),
        }
    }
}

/// Overlap between the analyzed text and one other stored document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlagiarismMatch {
    /// Human-readable label, e.g. `"Document doc-42"`.
    pub source_label: String,
    pub source_document_id: String,
    /// Share of the analyzed document's shingles found in the source, in
    /// `[0, 100]`.
    pub similarity_percent: f64,
    /// First matched shingle text, plus `" ... "` and the last one when the
    /// group has more than one record.
    pub merged_text: String,
    /// Smallest start offset over the matched records of the source.
    pub start: usize,
    /// Largest end offset over the matched records of the source.
    pub end: usize,
}

/// Result of a plagiarism analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlagiarismReport {
    /// Estimated share of shingles with no corpus match, in `[0, 100]`.
    pub uniqueness_percent: f64,
    pub total_shingle_count: usize,
    /// Never exceeds `total_shingle_count`.
    pub unique_shingle_count: usize,
    pub matches: Vec<PlagiarismMatch>,
    pub processed_at: DateTime<Utc>,
}

impl PlagiarismReport {
    /// Report for text with nothing to compare: fully unique, no shingles.
    pub fn fully_unique() -> Self {
        Self {
            uniqueness_percent: 100.0,
            total_shingle_count: 0,
            unique_shingle_count: 0,
            matches: Vec::new(),
            processed_at: Utc::now(),
        }
    }
}

/// Descriptive statistics of the original (unnormalized) text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TextStatistics {
    pub paragraph_count: usize,
    pub word_count: usize,
    pub character_count: usize,
    pub sentence_count: usize,
}

/// Whether the analyzed document's fingerprints reached the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PersistenceStatus {
    /// Records replaced the document's previous fingerprints.
    Persisted,
    /// The write failed or timed out; the report is still valid but later
    /// analyses may not see this document.
    ///
    /// A timed-out write is not cancelled inside the backend (redb runs it
    /// on the blocking pool), so it can still land after this status is
    /// returned.
    Degraded { reason: String },
    /// Nothing to persist (empty normalized text).
    Skipped,
}

impl PersistenceStatus {
    pub fn is_degraded(&self) -> bool {
        matches!(self, PersistenceStatus::Degraded { .. })
    }

    /// Short label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            PersistenceStatus::Persisted => "persisted",
            PersistenceStatus::Degraded { .. } => "degraded",
            PersistenceStatus::Skipped => "skipped",
        }
    }
}

/// A report together with the persistence outcome of its fingerprints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisOutcome {
    pub report: PlagiarismReport,
    pub persistence: PersistenceStatus,
}

/// Errors produced by the matching layer.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Invalid matching configuration.
    #[error("invalid match config: {0}")]
    InvalidConfig(String),
    /// Fingerprint store query failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors produced by [`Analyzer`](crate::Analyzer).
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("document id must not be empty")]
    MissingDocumentId,
    #[error("invalid analyzer config: {0}")]
    InvalidConfig(String),
    #[error("normalizer config error: {0}")]
    Canonical(#[from] CanonicalError),
    #[error("shingle error: {0}")]
    Shingle(#[from] ShingleError),
    /// Records failed validation before any store I/O.
    #[error("malformed shingle records: {0}")]
    Malformed(StoreError),
    #[error("match error: {0}")]
    Match(#[from] MatchError),
    #[error("store {operation} timed out after {timeout:?}")]
    StoreTimeout {
        operation: &'static str,
        timeout: Duration,
    },
    #[error("analysis cancelled")]
    Cancelled,
}
