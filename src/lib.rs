//! Workspace umbrella crate for shinglecheck.
//!
//! shinglecheck detects near-duplicate and plagiarised text. Documents are
//! normalized ([`canonical`]), cut into hashed word shingles ([`shingle`]),
//! stored in a fingerprint store ([`index`]) and compared against every
//! other stored document ([`matcher`]). This crate re-exports the stage APIs
//! and adds the pieces an application needs around them: YAML
//! configuration, content providers, and a service that caches finished
//! analyses.
//!
//! ```
//! use std::sync::Arc;
//! use shinglecheck::{
//!     Analyzer, ContentAnalysisService, InMemoryAnalysisRepository, InMemoryContentProvider,
//! };
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let content = InMemoryContentProvider::new()
//!     .with_document("a", "Быстрая коричневая лиса прыгает через забор")
//!     .with_document("b", "Быстрая коричневая лиса прыгает через забор!");
//! let service = ContentAnalysisService::new(
//!     Arc::new(Analyzer::in_memory_default()),
//!     Arc::new(InMemoryAnalysisRepository::new()),
//!     Arc::new(content),
//! );
//!
//! service.analyse("a").await.unwrap();
//! let b = service.analyse("b").await.unwrap();
//! assert_eq!(b.plagiarism_report.unwrap().matches[0].source_document_id, "a");
//! # });
//! ```

pub mod analysis;
pub mod config;
pub mod content;
pub mod service;

pub use canonical::{
    collapse_whitespace, is_stop_word, normalize, normalize_with, stem, strip_markup,
    CanonicalError, NormalizeConfig,
};
pub use index::{
    BackendConfig, CompressionCodec, CompressionConfig, FingerprintStore, InMemoryStore,
    ShingleRecord, StoreConfig, StoreError,
};
#[cfg(feature = "backend-redb")]
pub use index::RedbStore;
pub use matcher::{
    find_matches, group_matches, set_analysis_metrics, text_statistics, AnalysisMetrics,
    AnalysisOutcome, AnalyzeError, Analyzer, AnalyzerConfig, MatchConfig, MatchError,
    PersistenceStatus, PlagiarismMatch, PlagiarismReport, TextStatistics,
};
pub use shingle::{
    assemble, fingerprint, hash_shingle, make_shingles, Shingle, ShingleConfig, ShingleError,
};

pub use crate::analysis::{Analysis, AnalysisRepository, InMemoryAnalysisRepository};
pub use crate::config::{
    AnalysisYamlConfig, ConfigLoadError, LoggingYamlConfig, ShingleCheckConfig, StoreYamlConfig,
};
pub use crate::content::{ContentProvider, FsContentProvider, InMemoryContentProvider};
pub use crate::service::{build_analyzer, ContentAnalysisService, ServiceError};
