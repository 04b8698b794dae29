//! # shinglecheck matcher (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` sits on top of the normalizer (`canonical`), the shingle
//! generator (`shingle`) and the fingerprint store (`index`). It turns a
//! document's raw text into a plagiarism report: how much of the text is
//! unique, and which stored documents it overlaps with.
//!
//! ## Core Types
//!
//! - [`Analyzer`]: runs normalize → fingerprint → persist → match → score
//!   for one document against a shared [`index::FingerprintStore`].
//! - [`AnalyzerConfig`]: nested normalizer, shingle and match configs plus
//!   the per-call store timeout.
//! - [`PlagiarismReport`] / [`PlagiarismMatch`]: the emitted report.
//! - [`AnalysisOutcome`]: a report plus [`PersistenceStatus`], which tells
//!   a fully persisted analysis apart from one whose fingerprints could not
//!   be written.
//! - [`find_matches`] / [`group_matches`]: the corpus lookup and the pure
//!   grouping step on their own.
//! - [`text_statistics`]: paragraph, word, character and sentence counts.
//!
//! ## Example Usage
//!
//! ```
//! use matcher::{Analyzer, PersistenceStatus};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let analyzer = Analyzer::in_memory_default();
//!
//! let first = analyzer
//!     .analyze("Быстрая коричневая лиса прыгает через забор", "doc-1")
//!     .await
//!     .unwrap();
//! assert_eq!(first.report.uniqueness_percent, 100.0);
//! assert_eq!(first.persistence, PersistenceStatus::Persisted);
//!
//! let second = analyzer
//!     .analyze("<p>Быстрая коричневая лиса прыгает через забор!</p>", "doc-2")
//!     .await
//!     .unwrap();
//! assert_eq!(second.report.matches.len(), 1);
//! assert_eq!(second.report.matches[0].source_document_id, "doc-1");
//! # });
//! ```
//!
//! ## Observability
//!
//! Every analysis logs through `tracing` under a `matcher.analyze` span.
//! Install an [`AnalysisMetrics`] implementation via
//! [`set_analysis_metrics`] to record per-analysis latency and counts.

pub mod engine;
mod matching;
pub mod metrics;
mod stats;
pub mod types;

pub use crate::engine::{Analyzer, AnalyzerConfig};
pub use crate::matching::{find_matches, group_matches};
pub use crate::metrics::{set_analysis_metrics, AnalysisMetrics};
pub use crate::stats::text_statistics;
pub use crate::types::{
    AnalysisOutcome, AnalyzeError, MatchConfig, MatchError, PersistenceStatus, PlagiarismMatch,
    PlagiarismReport, TextStatistics,
};
