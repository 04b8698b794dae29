use std::sync::RwLock;

use async_trait::async_trait;
use hashbrown::{HashMap, HashSet};

use crate::{sort_records, validate_records, ShingleRecord, StoreError};

/// Storage for per-document shingle records.
///
/// Every operation is individually atomic. Serializing concurrent writes to
/// the same document id is the caller's concern.
#[async_trait]
pub trait FingerprintStore: Send + Sync {
    /// Replaces all records of `document_id` with `records`.
    ///
    /// An empty `records` list is a no-op. Malformed records are rejected
    /// before anything is written.
    async fn store_shingles(
        &self,
        document_id: &str,
        records: Vec<ShingleRecord>,
    ) -> Result<(), StoreError>;

    /// Returns every record whose hash is in `hashes`, excluding records of
    /// `exclude_document_id`, ordered by `(document_id, start)`.
    async fn find_matching_shingles(
        &self,
        hashes: &[String],
        exclude_document_id: &str,
    ) -> Result<Vec<ShingleRecord>, StoreError>;

    /// Removes all records of `document_id`. Unknown ids are not an error.
    async fn delete_shingles(&self, document_id: &str) -> Result<(), StoreError>;

    /// Number of documents with at least one stored record.
    async fn document_count(&self) -> Result<usize, StoreError>;
}

/// Configuration for selecting a backend.
///
/// # Example
/// ```
/// use index::BackendConfig;
///
/// let config = BackendConfig::in_memory();
/// let config = BackendConfig::redb("/data/shingles.redb");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BackendConfig {
    /// On-disk redb database at `path`.
    ///
    /// Requires the `backend-redb` feature (enabled by default).
    Redb { path: String },
    /// Process-local store, lost on exit.
    #[default]
    InMemory,
}

impl BackendConfig {
    pub fn in_memory() -> Self {
        BackendConfig::InMemory
    }

    pub fn redb<P: Into<String>>(path: P) -> Self {
        BackendConfig::Redb { path: path.into() }
    }
}

#[derive(Default)]
struct Inner {
    documents: HashMap<String, Vec<ShingleRecord>>,
    /// hash -> ids of documents containing it
    postings: HashMap<String, HashSet<String>>,
}

impl Inner {
    fn remove_document(&mut self, document_id: &str) {
        let Some(old) = self.documents.remove(document_id) else {
            return;
        };
        for rec in old {
            if let Some(docs) = self.postings.get_mut(&rec.hash) {
                docs.remove(document_id);
                if docs.is_empty() {
                    self.postings.remove(&rec.hash);
                }
            }
        }
    }
}

/// An in-memory store using a `RwLock` around an inverted index.
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FingerprintStore for InMemoryStore {
    async fn store_shingles(
        &self,
        document_id: &str,
        records: Vec<ShingleRecord>,
    ) -> Result<(), StoreError> {
        validate_records(document_id, &records)?;
        if records.is_empty() {
            return Ok(());
        }

        // Delete and insert under one write lock.
        let mut guard = self
            .inner
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        guard.remove_document(document_id);
        for rec in &records {
            guard
                .postings
                .entry(rec.hash.clone())
                .or_default()
                .insert(document_id.to_string());
        }
        guard.documents.insert(document_id.to_string(), records);
        Ok(())
    }

    async fn find_matching_shingles(
        &self,
        hashes: &[String],
        exclude_document_id: &str,
    ) -> Result<Vec<ShingleRecord>, StoreError> {
        if hashes.is_empty() {
            return Ok(Vec::new());
        }
        let wanted: HashSet<&str> = hashes.iter().map(String::as_str).collect();

        let guard = self
            .inner
            .read()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        let mut candidates: HashSet<&str> = HashSet::new();
        for hash in &wanted {
            if let Some(docs) = guard.postings.get(*hash) {
                candidates.extend(
                    docs.iter()
                        .map(String::as_str)
                        .filter(|doc| *doc != exclude_document_id),
                );
            }
        }

        let mut out = Vec::new();
        for doc in candidates {
            if let Some(records) = guard.documents.get(doc) {
                out.extend(
                    records
                        .iter()
                        .filter(|rec| wanted.contains(rec.hash.as_str()))
                        .cloned(),
                );
            }
        }
        sort_records(&mut out);
        Ok(out)
    }

    async fn delete_shingles(&self, document_id: &str) -> Result<(), StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))?
            .remove_document(document_id);
        Ok(())
    }

    async fn document_count(&self) -> Result<usize, StoreError> {
        let guard = self
            .inner
            .read()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        Ok(guard.documents.len())
    }
}

/// On-disk store built on redb.
#[cfg(feature = "backend-redb")]
pub mod redb;

#[cfg(feature = "backend-redb")]
pub use redb::RedbStore;
