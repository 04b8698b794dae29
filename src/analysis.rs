//! Stored analysis results and the repository that keeps them.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use matcher::{AnalysisOutcome, PersistenceStatus, PlagiarismReport, TextStatistics};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::service::ServiceError;

/// The result of analysing one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub id: Uuid,
    pub document_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plagiarism_report: Option<PlagiarismReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistence: Option<PersistenceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<TextStatistics>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Analysis {
    pub fn new(document_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            document_id: document_id.into(),
            plagiarism_report: None,
            persistence: None,
            statistics: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_plagiarism_report(&mut self, report: PlagiarismReport) {
        self.plagiarism_report = Some(report);
        self.touch();
    }

    /// Stores the report together with how its fingerprints were persisted.
    pub fn set_outcome(&mut self, outcome: AnalysisOutcome) {
        self.persistence = Some(outcome.persistence);
        self.set_plagiarism_report(outcome.report);
    }

    pub fn set_statistics(&mut self, statistics: TextStatistics) {
        self.statistics = Some(statistics);
        self.touch();
    }

    /// The report as a JSON string, `None` when no report is set.
    pub fn report_json(&self) -> Result<Option<String>, serde_json::Error> {
        self.plagiarism_report
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
    }

    /// The statistics as a JSON string, `None` when none are set.
    pub fn statistics_json(&self) -> Result<Option<String>, serde_json::Error> {
        self.statistics
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
    }

    /// Replaces the report from JSON; an empty string clears it.
    pub fn set_report_from_json(&mut self, json: &str) -> Result<(), serde_json::Error> {
        if json.trim().is_empty() {
            self.plagiarism_report = None;
            return Ok(());
        }
        let report: PlagiarismReport = serde_json::from_str(json)?;
        self.set_plagiarism_report(report);
        Ok(())
    }

    /// Replaces the statistics from JSON; an empty string clears them.
    pub fn set_statistics_from_json(&mut self, json: &str) -> Result<(), serde_json::Error> {
        if json.trim().is_empty() {
            self.statistics = None;
            return Ok(());
        }
        let statistics: TextStatistics = serde_json::from_str(json)?;
        self.set_statistics(statistics);
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Storage for finished analyses.
#[async_trait]
pub trait AnalysisRepository: Send + Sync {
    /// Insert or replace an analysis, keyed by its id.
    async fn store(&self, analysis: Analysis) -> Result<(), ServiceError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Analysis>, ServiceError>;

    /// The most recently stored analysis of `document_id`.
    async fn find_by_document_id(&self, document_id: &str)
        -> Result<Option<Analysis>, ServiceError>;
}

#[derive(Default)]
struct Analyses {
    by_id: HashMap<Uuid, Analysis>,
    latest: HashMap<String, Uuid>,
}

/// Process-local [`AnalysisRepository`].
#[derive(Default)]
pub struct InMemoryAnalysisRepository {
    inner: RwLock<Analyses>,
}

impl InMemoryAnalysisRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .map(|guard| guard.by_id.len())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AnalysisRepository for InMemoryAnalysisRepository {
    async fn store(&self, analysis: Analysis) -> Result<(), ServiceError> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| ServiceError::Repository("poisoned lock".into()))?;
        guard
            .latest
            .insert(analysis.document_id.clone(), analysis.id);
        guard.by_id.insert(analysis.id, analysis);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Analysis>, ServiceError> {
        let guard = self
            .inner
            .read()
            .map_err(|_| ServiceError::Repository("poisoned lock".into()))?;
        Ok(guard.by_id.get(&id).cloned())
    }

    async fn find_by_document_id(
        &self,
        document_id: &str,
    ) -> Result<Option<Analysis>, ServiceError> {
        let guard = self
            .inner
            .read()
            .map_err(|_| ServiceError::Repository("poisoned lock".into()))?;
        Ok(guard
            .latest
            .get(document_id)
            .and_then(|id| guard.by_id.get(id))
            .cloned())
    }
}
