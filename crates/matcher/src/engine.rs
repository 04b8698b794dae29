use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use canonical::{normalize_with, NormalizeConfig};
use chrono::Utc;
use hashbrown::HashSet;
use index::{validate_records, FingerprintStore, InMemoryStore, ShingleRecord};
use serde::{Deserialize, Serialize};
use shingle::{fingerprint, Shingle, ShingleConfig};
use tracing::{debug, info, warn, Instrument};

use crate::matching::find_matches;
use crate::metrics::metrics_recorder;
use crate::types::{
    AnalysisOutcome, AnalyzeError, MatchConfig, PersistenceStatus, PlagiarismMatch,
    PlagiarismReport,
};


/// Configuration for [`Analyzer`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub normalize: NormalizeConfig,
    pub shingle: ShingleConfig,
    pub matching: MatchConfig,
    /// Upper bound for each individual store call.
    #[serde(with = "duration_millis")]
    pub store_timeout: Duration,
}

impl AnalyzerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_normalize(mut self, normalize: NormalizeConfig) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn with_shingle(mut self, shingle: ShingleConfig) -> Self {
        self.shingle = shingle;
        self
    }

    pub fn with_matching(mut self, matching: MatchConfig) -> Self {
        self.matching = matching;
        self
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    /// Validate every nested configuration.
    pub fn validate(&self) -> Result<(), AnalyzeError> {
        self.normalize.validate()?;
        self.shingle.validate()?;
        self.matching.validate()?;
        if self.store_timeout.is_zero() {
            return Err(AnalyzeError::InvalidConfig(
                "store_timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            normalize: NormalizeConfig::default(),
            shingle: ShingleConfig::default(),
            matching: MatchConfig::default(),
            store_timeout: Duration::from_secs(30),
        }
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

/// Plagiarism analyzer over a shared fingerprint store.
pub struct Analyzer {
    store: Arc<dyn FingerprintStore>,
    cfg: AnalyzerConfig,
}

impl Analyzer {
    /// Construct an analyzer from a shared store and an explicit config.
    pub fn new(store: Arc<dyn FingerprintStore>, cfg: AnalyzerConfig) -> Result<Self, AnalyzeError> {
        cfg.validate()?;
        Ok(Self { store, cfg })
    }

    /// Convenience helper backed by a fresh in-memory store.
    pub fn in_memory_default() -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
            cfg: AnalyzerConfig::default(),
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.cfg
    }

    pub fn store(&self) -> &Arc<dyn FingerprintStore> {
        &self.store
    }

    /// Analyze `raw_text` as document `doc_id`.
    ///
    /// The document's fingerprints replace any previously stored ones and
    /// are then matched against every other document in the store. A failed
    /// write does not fail the analysis; it is reported through
    /// [`AnalysisOutcome::persistence`]. A failed or timed-out query does.
    pub async fn analyze(
        &self,
        raw_text: &str,
        doc_id: &str,
    ) -> Result<AnalysisOutcome, AnalyzeError> {
        let doc_id = doc_id.trim();
        if doc_id.is_empty() {
            return Err(AnalyzeError::MissingDocumentId);
        }

        let span = tracing::info_span!("matcher.analyze", document_id = %doc_id);
        self.analyze_inner(raw_text, doc_id).instrument(span).await
    }

    /// Like [`analyze`](Self::analyze), but gives up with
    /// [`AnalyzeError::Cancelled`] as soon as `signal` completes.
    ///
    /// Work already committed to the store (a finished replace) is not
    /// rolled back.
    pub async fn analyze_until<F>(
        &self,
        raw_text: &str,
        doc_id: &str,
        signal: F,
    ) -> Result<AnalysisOutcome, AnalyzeError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            result = self.analyze(raw_text, doc_id) => result,
            _ = signal => {
                info!(document_id = %doc_id, "analysis_cancelled");
                Err(AnalyzeError::Cancelled)
            }
        }
    }

    async fn analyze_inner(
        &self,
        raw_text: &str,
        doc_id: &str,
    ) -> Result<AnalysisOutcome, AnalyzeError> {
        let start = Instant::now();
        info!(input_chars = raw_text.chars().count(), "analysis_started");

        let normalized = normalize_with(raw_text, &self.cfg.normalize);
        if normalized.is_empty() {
            return Ok(self.finish_unique(doc_id, start, "empty_after_normalization"));
        }

        let shingles = fingerprint(&normalized, &self.cfg.shingle)?;
        if shingles.is_empty() {
            return Ok(self.finish_unique(doc_id, start, "no_shingles"));
        }
        debug!(shingles = shingles.len(), "fingerprinted");

        let hashes: Vec<String> = shingles.iter().map(|s| s.hash.clone()).collect();
        let records = to_records(doc_id, &shingles);
        validate_records(doc_id, &records).map_err(AnalyzeError::Malformed)?;

        let persistence = self.persist(doc_id, records).await;

        let matches = tokio::time::timeout(
            self.cfg.store_timeout,
            find_matches(self.store.as_ref(), &hashes, doc_id, &self.cfg.matching),
        )
        .await
        .map_err(|_| AnalyzeError::StoreTimeout {
            operation: "find_matching_shingles",
            timeout: self.cfg.store_timeout,
        })??;
        debug!(matches = matches.len(), "matched");

        let (unique_shingle_count, uniqueness_percent) = uniqueness(&hashes, &matches);
        let report = PlagiarismReport {
            uniqueness_percent,
            total_shingle_count: hashes.len(),
            unique_shingle_count,
            matches,
            processed_at: Utc::now(),
        };

        let latency = start.elapsed();
        info!(
            uniqueness_percent = report.uniqueness_percent,
            total_shingles = report.total_shingle_count,
            matches = report.matches.len(),
            persistence = persistence.as_str(),
            elapsed_micros = latency.as_micros() as u64,
            "analysis_completed"
        );
        if let Some(recorder) = metrics_recorder() {
            recorder.record_analysis(
                doc_id,
                latency,
                report.total_shingle_count,
                report.matches.len(),
                &persistence,
            );
        }

        Ok(AnalysisOutcome {
            report,
            persistence,
        })
    }

    /// Replaces the document's records; failures degrade instead of failing.
    async fn persist(&self, doc_id: &str, records: Vec<ShingleRecord>) -> PersistenceStatus {
        let write = tokio::time::timeout(
            self.cfg.store_timeout,
            self.store.store_shingles(doc_id, records),
        )
        .await;
        match write {
            Ok(Ok(())) => PersistenceStatus::Persisted,
            Ok(Err(err)) => {
                warn!(error = %err, "persist_failed");
                PersistenceStatus::Degraded {
                    reason: err.to_string(),
                }
            }
            Err(_) => {
                // The backend may still commit after the await is dropped.
                let reason = format!(
                    "store write outcome unknown: timed out after {:?}",
                    self.cfg.store_timeout
                );
                warn!(error = %reason, "persist_failed");
                PersistenceStatus::Degraded { reason }
            }
        }
    }

    fn finish_unique(&self, doc_id: &str, start: Instant, why: &'static str) -> AnalysisOutcome {
        let report = PlagiarismReport::fully_unique();
        let persistence = PersistenceStatus::Skipped;
        let latency = start.elapsed();
        info!(
            reason = why,
            elapsed_micros = latency.as_micros() as u64,
            "analysis_completed_without_shingles"
        );
        if let Some(recorder) = metrics_recorder() {
            recorder.record_analysis(doc_id, latency, 0, 0, &persistence);
        }
        AnalysisOutcome {
            report,
            persistence,
        }
    }
}

fn to_records(doc_id: &str, shingles: &[Shingle]) -> Vec<ShingleRecord> {
    shingles
        .iter()
        .map(|s| ShingleRecord::new(doc_id, s.hash.clone(), s.text.clone(), s.start, s.end))
        .collect()
}

/// Estimates `(unique_shingle_count, uniqueness_percent)`.
///
/// Each match contributes `round(distinct * similarity / 100)` matched
/// shingles; the sum is capped at the distinct hash count. Overlapping
/// sources are not deduplicated, so the estimate errs towards lower
/// uniqueness.
pub(crate) fn uniqueness(hashes: &[String], matches: &[PlagiarismMatch]) -> (usize, f64) {
    let total = hashes.len();
    if total == 0 {
        return (0, 100.0);
    }
    let distinct = hashes.iter().collect::<HashSet<_>>().len();

    let matched: usize = matches
        .iter()
        .map(|m| (distinct as f64 * m.similarity_percent / 100.0).round() as usize)
        .sum();
    let unique = distinct - matched.min(distinct);
    let percent = (unique as f64 / total as f64 * 100.0).clamp(0.0, 100.0);
    (unique, percent)
}
