// Metrics hooks for the analyzer.
//
// Callers install a global `AnalysisMetrics` implementation via
// [`set_analysis_metrics`]; every completed `Analyzer::analyze` call then
// reports its latency, shingle count, match count and persistence outcome.
// No metrics backend is linked here.
use std::sync::{Arc, RwLock};
use std::time::Duration;

use once_cell::sync::OnceCell;

use crate::types::PersistenceStatus;

/// Metrics observer for analyses.
pub trait AnalysisMetrics: Send + Sync {
    /// Record the outcome of one successful analysis.
    ///
    /// `shingle_count` is the total number of shingles of the analyzed text
    /// and `match_count` the number of reported source documents.
    fn record_analysis(
        &self,
        document_id: &str,
        latency: Duration,
        shingle_count: usize,
        match_count: usize,
        persistence: &PersistenceStatus,
    );
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn AnalysisMetrics>>> {
    static METRICS: OnceCell<RwLock<Option<Arc<dyn AnalysisMetrics>>>> = OnceCell::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub(crate) fn metrics_recorder() -> Option<Arc<dyn AnalysisMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Install or clear the global analysis metrics recorder.
///
/// Usually called once at startup so all analyzers share one backend.
pub fn set_analysis_metrics(recorder: Option<Arc<dyn AnalysisMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}
