//! Document-level analysis: fetch content, score it, keep the result.

use std::sync::Arc;

use index::StoreError;
use matcher::{text_statistics, AnalysisOutcome, AnalyzeError, Analyzer};
use thiserror::Error;
use tracing::{debug, info, warn, Instrument};

use crate::analysis::{Analysis, AnalysisRepository};
use crate::config::{ConfigLoadError, ShingleCheckConfig};
use crate::content::ContentProvider;

/// Errors surfaced by the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("document id must not be empty")]
    MissingDocumentId,

    #[error("invalid document id: {0:?}")]
    InvalidDocumentId(String),

    #[error("content not found for document {0}")]
    ContentNotFound(String),

    #[error("content of document {0} is not valid UTF-8")]
    InvalidContent(String),

    #[error("failed to read content of document {document_id}: {source}")]
    ContentRead {
        document_id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("analysis failed: {0}")]
    Analyze(#[from] AnalyzeError),

    #[error("repository error: {0}")]
    Repository(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigLoadError),
}

/// Open the configured store and wrap it in an [`Analyzer`].
pub fn build_analyzer(config: &ShingleCheckConfig) -> Result<Analyzer, ServiceError> {
    let store = config.store_config()?.build()?;
    Ok(Analyzer::new(store, config.analyzer_config())?)
}

/// Ties an [`Analyzer`] to a content source and an analysis repository.
pub struct ContentAnalysisService {
    analyzer: Arc<Analyzer>,
    repository: Arc<dyn AnalysisRepository>,
    content: Arc<dyn ContentProvider>,
}

impl ContentAnalysisService {
    pub fn new(
        analyzer: Arc<Analyzer>,
        repository: Arc<dyn AnalysisRepository>,
        content: Arc<dyn ContentProvider>,
    ) -> Self {
        Self {
            analyzer,
            repository,
            content,
        }
    }

    pub fn analyzer(&self) -> &Arc<Analyzer> {
        &self.analyzer
    }

    /// Full analysis of `document_id`: plagiarism report and statistics.
    ///
    /// A stored analysis that carries a report is returned as is. Store
    /// failures (query errors, timeouts, cancellation) fail the call and
    /// nothing is stored, so a later call retries. Any other failing
    /// plagiarism step is logged and leaves [`Analysis::plagiarism_report`]
    /// empty; the statistics are still computed and the analysis is stored.
    pub async fn analyse(&self, document_id: &str) -> Result<Analysis, ServiceError> {
        let document_id = checked_id(document_id)?;
        let span = tracing::info_span!("service.analyse", document_id = %document_id);
        self.analyse_inner(document_id).instrument(span).await
    }

    async fn analyse_inner(&self, document_id: &str) -> Result<Analysis, ServiceError> {
        if let Some(existing) = self.repository.find_by_document_id(document_id).await? {
            if existing.plagiarism_report.is_some() {
                info!(analysis_id = %existing.id, "analysis_cache_hit");
                return Ok(existing);
            }
            debug!(analysis_id = %existing.id, "cached_analysis_without_report");
        }

        let content = self.content.get_content(document_id).await?;
        let mut analysis = Analysis::new(document_id);

        match self.analyzer.analyze(&content, document_id).await {
            Ok(outcome) => analysis.set_outcome(outcome),
            Err(err) if is_store_failure(&err) => {
                warn!(error = %err, "plagiarism_analysis_unavailable");
                return Err(err.into());
            }
            Err(err) => warn!(error = %err, "plagiarism_analysis_failed"),
        }

        analysis.set_statistics(text_statistics(&content));
        self.repository.store(analysis.clone()).await?;
        info!(
            analysis_id = %analysis.id,
            has_report = analysis.plagiarism_report.is_some(),
            "analysis_stored"
        );
        Ok(analysis)
    }

    /// Plagiarism step only; nothing is cached and failures propagate.
    pub async fn analyze_plagiarism(
        &self,
        document_id: &str,
    ) -> Result<AnalysisOutcome, ServiceError> {
        let document_id = checked_id(document_id)?;
        let content = self.content.get_content(document_id).await?;
        Ok(self.analyzer.analyze(&content, document_id).await?)
    }
}

fn checked_id(document_id: &str) -> Result<&str, ServiceError> {
    let document_id = document_id.trim();
    if document_id.is_empty() {
        return Err(ServiceError::MissingDocumentId);
    }
    Ok(document_id)
}

/// Failures of the store or of the caller's patience, as opposed to
/// problems with the document itself.
fn is_store_failure(err: &AnalyzeError) -> bool {
    matches!(
        err,
        AnalyzeError::Match(_) | AnalyzeError::StoreTimeout { .. } | AnalyzeError::Cancelled
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::InMemoryAnalysisRepository;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use index::{FingerprintStore, InMemoryStore, ShingleRecord};
    use matcher::{AnalyzerConfig, PersistenceStatus};

    use crate::content::InMemoryContentProvider;

    const ESSAY: &str = "Быстрая коричневая лиса прыгает через забор. \
                         Ленивая собака спокойно спит возле старого дома.";

    fn service(
        content: InMemoryContentProvider,
    ) -> (ContentAnalysisService, Arc<InMemoryAnalysisRepository>) {
        let repository = Arc::new(InMemoryAnalysisRepository::new());
        let service = ContentAnalysisService::new(
            Arc::new(Analyzer::in_memory_default()),
            repository.clone(),
            Arc::new(content),
        );
        (service, repository)
    }

    #[tokio::test]
    async fn analyse_builds_and_stores_analysis() {
        let (service, repository) =
            service(InMemoryContentProvider::new().with_document("essay", ESSAY));

        let analysis = service.analyse("essay").await.unwrap();
        assert_eq!(analysis.document_id, "essay");
        let report = analysis.plagiarism_report.as_ref().unwrap();
        assert_eq!(report.uniqueness_percent, 100.0);
        assert!(report.total_shingle_count > 0);
        assert_eq!(analysis.persistence, Some(PersistenceStatus::Persisted));

        let stats = analysis.statistics.unwrap();
        assert_eq!(stats.paragraph_count, 1);
        assert_eq!(stats.sentence_count, 2);
        assert_eq!(stats.word_count, ESSAY.split_whitespace().count());

        assert_eq!(repository.len(), 1);
        assert_eq!(
            repository.find_by_id(analysis.id).await.unwrap(),
            Some(analysis)
        );
    }

    #[tokio::test]
    async fn analyse_returns_cached_result() {
        let content = InMemoryContentProvider::new().with_document("essay", ESSAY);
        let (service, repository) = service(content);

        let first = service.analyse("essay").await.unwrap();
        let second = service.analyse("  essay ").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(repository.len(), 1);
    }

    #[tokio::test]
    async fn analyse_detects_copy_of_earlier_document() {
        let content = InMemoryContentProvider::new()
            .with_document("original", ESSAY)
            .with_document("copy", format!("<p>{ESSAY}</p>"));
        let (service, _) = service(content);

        service.analyse("original").await.unwrap();
        let copy = service.analyse("copy").await.unwrap();
        let report = copy.plagiarism_report.unwrap();
        assert_eq!(report.uniqueness_percent, 0.0);
        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.matches[0].source_document_id, "original");
        assert_eq!(report.matches[0].source_label, "Document original");
    }

    #[tokio::test]
    async fn missing_content_is_an_error() {
        let (service, repository) = service(InMemoryContentProvider::new());
        let err = service.analyse("ghost").await.unwrap_err();
        assert!(matches!(err, ServiceError::ContentNotFound(id) if id == "ghost"));
        assert!(repository.is_empty());

        assert!(matches!(
            service.analyze_plagiarism("ghost").await,
            Err(ServiceError::ContentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn blank_document_id_rejected() {
        let (service, _) = service(InMemoryContentProvider::new());
        assert!(matches!(
            service.analyse("   ").await,
            Err(ServiceError::MissingDocumentId)
        ));
    }

    #[tokio::test]
    async fn analyze_plagiarism_skips_cache() {
        let content = InMemoryContentProvider::new().with_document("essay", ESSAY);
        let (service, repository) = service(content);

        let outcome = service.analyze_plagiarism("essay").await.unwrap();
        assert_eq!(outcome.report.uniqueness_percent, 100.0);
        assert!(repository.is_empty());
    }

    /// Store whose queries fail while `down` is set.
    #[derive(Default)]
    struct OutageStore {
        inner: InMemoryStore,
        down: AtomicBool,
    }

    #[async_trait]
    impl FingerprintStore for OutageStore {
        async fn store_shingles(
            &self,
            document_id: &str,
            records: Vec<ShingleRecord>,
        ) -> Result<(), StoreError> {
            self.inner.store_shingles(document_id, records).await
        }

        async fn find_matching_shingles(
            &self,
            hashes: &[String],
            exclude_document_id: &str,
        ) -> Result<Vec<ShingleRecord>, StoreError> {
            if self.down.load(Ordering::SeqCst) {
                return Err(StoreError::backend("connection refused"));
            }
            self.inner
                .find_matching_shingles(hashes, exclude_document_id)
                .await
        }

        async fn delete_shingles(&self, document_id: &str) -> Result<(), StoreError> {
            self.inner.delete_shingles(document_id).await
        }

        async fn document_count(&self) -> Result<usize, StoreError> {
            self.inner.document_count().await
        }
    }

    #[tokio::test]
    async fn store_outage_is_not_cached() {
        let store = Arc::new(OutageStore::default());
        store.down.store(true, Ordering::SeqCst);
        let analyzer = Analyzer::new(store.clone(), AnalyzerConfig::default()).unwrap();
        let repository = Arc::new(InMemoryAnalysisRepository::new());
        let service = ContentAnalysisService::new(
            Arc::new(analyzer),
            repository.clone(),
            Arc::new(InMemoryContentProvider::new().with_document("essay", ESSAY)),
        );

        let err = service.analyse("essay").await.unwrap_err();
        assert!(matches!(err, ServiceError::Analyze(AnalyzeError::Match(_))));
        assert!(repository.is_empty());

        store.down.store(false, Ordering::SeqCst);
        let analysis = service.analyse("essay").await.unwrap();
        assert!(analysis.plagiarism_report.is_some());
        assert!(analysis.statistics.is_some());
        assert_eq!(repository.len(), 1);
    }

    #[tokio::test]
    async fn stored_analysis_without_report_is_recomputed() {
        let content = InMemoryContentProvider::new().with_document("essay", ESSAY);
        let (service, repository) = service(content);

        let mut partial = Analysis::new("essay");
        partial.set_statistics(text_statistics(ESSAY));
        repository.store(partial.clone()).await.unwrap();

        let analysis = service.analyse("essay").await.unwrap();
        assert_ne!(analysis.id, partial.id);
        assert!(analysis.plagiarism_report.is_some());
        assert_eq!(
            repository.find_by_document_id("essay").await.unwrap().map(|a| a.id),
            Some(analysis.id)
        );
    }

    #[tokio::test]
    async fn analyze_plagiarism_trims_document_id() {
        let content = InMemoryContentProvider::new().with_document("essay", ESSAY);
        let (service, _) = service(content);

        let outcome = service.analyze_plagiarism("  essay ").await.unwrap();
        assert_eq!(outcome.persistence, PersistenceStatus::Persisted);
        assert_eq!(
            service.analyzer().store().document_count().await.unwrap(),
            1
        );
        assert!(matches!(
            service.analyze_plagiarism(" \t").await,
            Err(ServiceError::MissingDocumentId)
        ));
    }

    #[test]
    fn build_analyzer_from_default_config() {
        let analyzer = build_analyzer(&ShingleCheckConfig::default()).unwrap();
        assert_eq!(analyzer.config().shingle.n, 4);
    }
}
