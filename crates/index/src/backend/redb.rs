//! Redb backend for the fingerprint store.
//!
//! Two tables live in one database file:
//!
//! - `documents`: document id -> encoded record batch
//! - `postings`: shingle hash -> document ids (multimap)
//!
//! Each trait call runs one redb transaction on tokio's blocking pool, so a
//! replace is atomic and readers see either the old or the new record set.
//!
//! # Configuration Example
//! ```yaml
//! store:
//!   backend: redb
//!   path: /data/shingles.redb
//!   compression: zstd
//!   level: 3
//! ```

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use hashbrown::HashSet;
use redb::{
    Database, MultimapTableDefinition, ReadableDatabase, ReadableMultimapTable, ReadableTable,
    ReadableTableMetadata, TableDefinition, WriteTransaction,
};

use crate::{
    sort_records, validate_records, CompressionConfig, FingerprintStore, ShingleRecord, StoreError,
};

const DOCUMENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("documents");
const POSTINGS: MultimapTableDefinition<&str, &str> = MultimapTableDefinition::new("postings");

/// Persistent fingerprint store.
///
/// The `Arc<Database>` is shared with blocking tasks; redb handles its own
/// locking and MVCC.
pub struct RedbStore {
    db: Arc<Database>,
    compression: CompressionConfig,
}

impl RedbStore {
    /// Open or create a store at the given path.
    ///
    /// ```no_run
    /// use index::{CompressionConfig, RedbStore};
    ///
    /// let store = RedbStore::open("/tmp/shingles.redb", CompressionConfig::default()).unwrap();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P, compression: CompressionConfig) -> Result<Self, StoreError> {
        let db = Database::create(path).map_err(StoreError::backend)?;

        // Create both tables up front so read transactions never miss them.
        let write_txn = db.begin_write().map_err(StoreError::backend)?;
        {
            write_txn
                .open_table(DOCUMENTS)
                .map_err(StoreError::backend)?;
            write_txn
                .open_multimap_table(POSTINGS)
                .map_err(StoreError::backend)?;
        }
        write_txn.commit().map_err(StoreError::backend)?;

        tracing::debug!(target: "shinglecheck::index", "opened redb fingerprint store");
        Ok(Self {
            db: Arc::new(db),
            compression,
        })
    }

    async fn run_blocking<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Database, &CompressionConfig) -> Result<T, StoreError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let compression = self.compression.clone();
        tokio::task::spawn_blocking(move || op(&db, &compression))
            .await
            .map_err(StoreError::backend)?
    }
}

/// Removes `document_id` from both tables inside an open write transaction.
fn remove_document(
    txn: &WriteTransaction,
    compression: &CompressionConfig,
    document_id: &str,
) -> Result<(), StoreError> {
    let mut documents = txn.open_table(DOCUMENTS).map_err(StoreError::backend)?;
    let old = documents
        .remove(document_id)
        .map_err(StoreError::backend)?
        .map(|guard| guard.value().to_vec());
    let Some(old) = old else {
        return Ok(());
    };

    let mut postings = txn
        .open_multimap_table(POSTINGS)
        .map_err(StoreError::backend)?;
    let hashes: HashSet<String> = match compression.decode_batch(&old) {
        Ok(batch) => batch.into_iter().map(|rec| rec.hash).collect(),
        Err(err) => {
            tracing::warn!(
                target: "shinglecheck::index",
                document_id,
                error = %err,
                "undecodable batch, scanning postings"
            );
            posting_keys_for(&postings, document_id)?
        }
    };
    for hash in &hashes {
        postings
            .remove(hash.as_str(), document_id)
            .map_err(StoreError::backend)?;
    }
    Ok(())
}

/// Every hash whose posting list contains `document_id`.
fn posting_keys_for(
    postings: &impl ReadableMultimapTable<&'static str, &'static str>,
    document_id: &str,
) -> Result<HashSet<String>, StoreError> {
    let mut hashes = HashSet::new();
    for entry in postings.iter().map_err(StoreError::backend)? {
        let (hash, docs) = entry.map_err(StoreError::backend)?;
        for doc in docs {
            if doc.map_err(StoreError::backend)?.value() == document_id {
                hashes.insert(hash.value().to_string());
                break;
            }
        }
    }
    Ok(hashes)
}

#[async_trait]
impl FingerprintStore for RedbStore {
    async fn store_shingles(
        &self,
        document_id: &str,
        records: Vec<ShingleRecord>,
    ) -> Result<(), StoreError> {
        validate_records(document_id, &records)?;
        if records.is_empty() {
            return Ok(());
        }

        let document_id = document_id.to_string();
        self.run_blocking(move |db, compression| {
            let payload = compression.encode_batch(&records)?;
            let hashes: HashSet<&str> = records.iter().map(|rec| rec.hash.as_str()).collect();

            let write_txn = db.begin_write().map_err(StoreError::backend)?;
            remove_document(&write_txn, compression, &document_id)?;
            {
                let mut documents = write_txn
                    .open_table(DOCUMENTS)
                    .map_err(StoreError::backend)?;
                documents
                    .insert(document_id.as_str(), payload.as_slice())
                    .map_err(StoreError::backend)?;

                let mut postings = write_txn
                    .open_multimap_table(POSTINGS)
                    .map_err(StoreError::backend)?;
                for hash in hashes {
                    postings
                        .insert(hash, document_id.as_str())
                        .map_err(StoreError::backend)?;
                }
            }
            write_txn.commit().map_err(StoreError::backend)?;
            Ok(())
        })
        .await
    }

    async fn find_matching_shingles(
        &self,
        hashes: &[String],
        exclude_document_id: &str,
    ) -> Result<Vec<ShingleRecord>, StoreError> {
        if hashes.is_empty() {
            return Ok(Vec::new());
        }
        let wanted: HashSet<String> = hashes.iter().cloned().collect();
        let exclude = exclude_document_id.to_string();

        self.run_blocking(move |db, compression| {
            let read_txn = db.begin_read().map_err(StoreError::backend)?;
            let postings = read_txn
                .open_multimap_table(POSTINGS)
                .map_err(StoreError::backend)?;
            let documents = read_txn
                .open_table(DOCUMENTS)
                .map_err(StoreError::backend)?;

            let mut candidates: HashSet<String> = HashSet::new();
            for hash in &wanted {
                for doc in postings.get(hash.as_str()).map_err(StoreError::backend)? {
                    let doc = doc.map_err(StoreError::backend)?;
                    if doc.value() != exclude {
                        candidates.insert(doc.value().to_string());
                    }
                }
            }

            let mut out = Vec::new();
            for doc in &candidates {
                let Some(bytes) = documents.get(doc.as_str()).map_err(StoreError::backend)? else {
                    continue;
                };
                let records = compression.decode_batch(bytes.value())?;
                out.extend(
                    records
                        .into_iter()
                        .filter(|rec| wanted.contains(&rec.hash)),
                );
            }
            sort_records(&mut out);
            Ok(out)
        })
        .await
    }

    async fn delete_shingles(&self, document_id: &str) -> Result<(), StoreError> {
        let document_id = document_id.to_string();
        self.run_blocking(move |db, compression| {
            let write_txn = db.begin_write().map_err(StoreError::backend)?;
            remove_document(&write_txn, compression, &document_id)?;
            write_txn.commit().map_err(StoreError::backend)?;
            Ok(())
        })
        .await
    }

    async fn document_count(&self) -> Result<usize, StoreError> {
        self.run_blocking(|db, _| {
            let read_txn = db.begin_read().map_err(StoreError::backend)?;
            let documents = read_txn
                .open_table(DOCUMENTS)
                .map_err(StoreError::backend)?;
            let len = documents.len().map_err(StoreError::backend)?;
            Ok(len as usize)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CompressionCodec;
    use tempfile::NamedTempFile;

    fn records(doc: &str, hashes: &[&str]) -> Vec<ShingleRecord> {
        hashes
            .iter()
            .enumerate()
            .map(|(i, h)| ShingleRecord::new(doc, *h, format!("shingle {i}"), i * 4, i * 4 + 3))
            .collect()
    }

    #[tokio::test]
    async fn test_redb_store_roundtrip() {
        let temp_file = NamedTempFile::new().unwrap();
        let store = RedbStore::open(temp_file.path(), CompressionConfig::default()).unwrap();

        store
            .store_shingles("doc-a", records("doc-a", &["h1", "h2"]))
            .await
            .unwrap();
        store
            .store_shingles("doc-b", records("doc-b", &["h2", "h3", "h2"]))
            .await
            .unwrap();

        let found = store
            .find_matching_shingles(&["h2".to_string()], "doc-a")
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|r| r.document_id == "doc-b"));
        assert_eq!(found[0].start, 0);
        assert_eq!(found[1].start, 8);
        assert_eq!(store.document_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_redb_store_replace() {
        let temp_file = NamedTempFile::new().unwrap();
        let store = RedbStore::open(
            temp_file.path(),
            CompressionConfig::default().with_codec(CompressionCodec::None),
        )
        .unwrap();

        store
            .store_shingles("doc-a", records("doc-a", &["old"]))
            .await
            .unwrap();
        store
            .store_shingles("doc-a", records("doc-a", &["new"]))
            .await
            .unwrap();

        assert!(store
            .find_matching_shingles(&["old".to_string()], "")
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            store
                .find_matching_shingles(&["new".to_string()], "")
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_redb_store_delete() {
        let temp_file = NamedTempFile::new().unwrap();
        let store = RedbStore::open(temp_file.path(), CompressionConfig::default()).unwrap();

        store
            .store_shingles("doc-a", records("doc-a", &["h1"]))
            .await
            .unwrap();
        store.delete_shingles("doc-a").await.unwrap();
        store.delete_shingles("doc-a").await.unwrap();

        assert_eq!(store.document_count().await.unwrap(), 0);
        assert!(store
            .find_matching_shingles(&["h1".to_string()], "")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_redb_store_survives_reopen() {
        let temp_file = NamedTempFile::new().unwrap();
        {
            let store = RedbStore::open(temp_file.path(), CompressionConfig::default()).unwrap();
            store
                .store_shingles("doc-a", records("doc-a", &["h1"]))
                .await
                .unwrap();
        }
        let store = RedbStore::open(temp_file.path(), CompressionConfig::default()).unwrap();
        let found = store
            .find_matching_shingles(&["h1".to_string()], "doc-z")
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "shingle 0");
    }

    fn plant_corrupt_batch(store: &RedbStore, document_id: &str, hashes: &[&str]) {
        let write_txn = store.db.begin_write().unwrap();
        {
            let mut documents = write_txn.open_table(DOCUMENTS).unwrap();
            documents
                .insert(document_id, b"not a batch".as_slice())
                .unwrap();
            let mut postings = write_txn.open_multimap_table(POSTINGS).unwrap();
            for hash in hashes {
                postings.insert(*hash, document_id).unwrap();
            }
        }
        write_txn.commit().unwrap();
    }

    #[tokio::test]
    async fn test_redb_store_replaces_undecodable_batch() {
        let temp_file = NamedTempFile::new().unwrap();
        let store = RedbStore::open(temp_file.path(), CompressionConfig::default()).unwrap();
        store
            .store_shingles("doc-b", records("doc-b", &["h-old"]))
            .await
            .unwrap();
        plant_corrupt_batch(&store, "doc-a", &["h-old", "h-gone"]);

        store
            .store_shingles("doc-a", records("doc-a", &["h1"]))
            .await
            .unwrap();

        let stale = store
            .find_matching_shingles(&["h-old".to_string(), "h-gone".to_string()], "")
            .await
            .unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].document_id, "doc-b");
        assert_eq!(
            store
                .find_matching_shingles(&["h1".to_string()], "")
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(store.document_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_redb_store_deletes_undecodable_batch() {
        let temp_file = NamedTempFile::new().unwrap();
        let store = RedbStore::open(temp_file.path(), CompressionConfig::default()).unwrap();
        plant_corrupt_batch(&store, "doc-a", &["h1", "h2"]);

        store.delete_shingles("doc-a").await.unwrap();

        assert_eq!(store.document_count().await.unwrap(), 0);
        let read_txn = store.db.begin_read().unwrap();
        let postings = read_txn.open_multimap_table(POSTINGS).unwrap();
        assert!(postings.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_redb_store_rejects_malformed_before_write() {
        let temp_file = NamedTempFile::new().unwrap();
        let store = RedbStore::open(temp_file.path(), CompressionConfig::default()).unwrap();

        let err = store
            .store_shingles("doc-a", records("doc-b", &["h1"]))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Malformed(_)));
        assert_eq!(store.document_count().await.unwrap(), 0);
    }
}
