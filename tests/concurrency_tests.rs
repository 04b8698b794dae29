//! Concurrency and thread safety tests for shinglecheck

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use shinglecheck::{
    normalize, AnalyzeError, Analyzer, AnalyzerConfig, FingerprintStore, InMemoryStore,
    ShingleRecord, StoreError,
};

const TEXT: &str = "Конкурентная нормализация текста должна давать одинаковый результат \
                    независимо от количества потоков";

fn document(i: usize) -> String {
    let words = ["alpha", "bravo", "charlie", "delta", "echo", "foxtrot", "golf", "hotel"];
    let mut tokens: Vec<String> = words.iter().map(|w| format!("{w}{}", letters(i))).collect();
    tokens.rotate_left(i % words.len());
    tokens.join(" ")
}

fn letters(mut n: usize) -> String {
    let mut s = String::new();
    loop {
        s.push((b'a' + (n % 26) as u8) as char);
        n /= 26;
        if n == 0 {
            return s;
        }
    }
}

#[test]
fn concurrent_normalize_same_input() {
    let expected = normalize(TEXT);
    let handles: Vec<_> = (0..10)
        .map(|_| thread::spawn(|| normalize(TEXT)))
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(
            handle.join().unwrap(),
            expected,
            "thread {i} produced different normalized text"
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_analyses_share_one_store() {
    let analyzer = Arc::new(Analyzer::in_memory_default());

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let analyzer = Arc::clone(&analyzer);
            tokio::spawn(async move {
                analyzer
                    .analyze(&document(i), &format!("doc-{i}"))
                    .await
                    .expect("analysis should succeed")
            })
        })
        .collect();

    for handle in handles {
        let outcome = handle.await.unwrap();
        assert!(outcome.report.matches.is_empty());
        assert_eq!(outcome.report.uniqueness_percent, 100.0);
    }
    assert_eq!(analyzer.store().document_count().await.unwrap(), 16);

    let copy = analyzer.analyze(&document(3), "copy-of-3").await.unwrap();
    assert_eq!(copy.report.matches.len(), 1);
    assert_eq!(copy.report.matches[0].source_document_id, "doc-3");
    assert_eq!(copy.report.uniqueness_percent, 0.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reanalysis_leaves_one_version() {
    let analyzer = Arc::new(Analyzer::in_memory_default());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let analyzer = Arc::clone(&analyzer);
            tokio::spawn(async move { analyzer.analyze(&document(i), "shared").await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(analyzer.store().document_count().await.unwrap(), 1);
}

/// Store whose queries take `delay`.
struct SlowStore {
    inner: InMemoryStore,
    delay: Duration,
}

#[async_trait]
impl FingerprintStore for SlowStore {
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
        tokio::time::sleep(self.delay).await;
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
async fn cancellation_signal_stops_slow_analysis() {
    let store = SlowStore {
        inner: InMemoryStore::new(),
        delay: Duration::from_secs(5),
    };
    let analyzer = Analyzer::new(Arc::new(store), AnalyzerConfig::default()).unwrap();

    let result = analyzer
        .analyze_until(
            &document(1),
            "doc-1",
            tokio::time::sleep(Duration::from_millis(20)),
        )
        .await;
    assert!(matches!(result, Err(AnalyzeError::Cancelled)));
}

#[tokio::test]
async fn slow_query_hits_store_timeout() {
    let store = SlowStore {
        inner: InMemoryStore::new(),
        delay: Duration::from_secs(5),
    };
    let cfg = AnalyzerConfig::default().with_store_timeout(Duration::from_millis(30));
    let analyzer = Analyzer::new(Arc::new(store), cfg).unwrap();

    let err = analyzer.analyze(&document(2), "doc-2").await.unwrap_err();
    assert!(matches!(
        err,
        AnalyzeError::StoreTimeout {
            operation: "find_matching_shingles",
            ..
        }
    ));
}
