//! # shinglecheck fingerprint store
//!
//! Persists shingle records per document and answers "which other documents
//! contain any of these hashes" queries. Matching and scoring live in the
//! matcher crate; this crate only stores and retrieves.
//!
//! ## Core Features
//!
//! - **Pluggable backends** behind the async [`FingerprintStore`] trait:
//!   - [`InMemoryStore`], a lock-protected inverted index for tests and
//!     single-process use.
//!   - [`RedbStore`], an on-disk store built on redb (feature `backend-redb`,
//!     on by default).
//! - **Atomic replace**: `store_shingles` deletes a document's previous
//!   records and inserts the new set in one step, so readers never observe
//!   a mix of old and new records.
//! - **Compact storage**: redb values are bincode-encoded record batches,
//!   optionally zstd-compressed.
//!
//! ## Example Usage
//!
//! ```
//! use index::{FingerprintStore, InMemoryStore, ShingleRecord};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let store = InMemoryStore::new();
//! let records = vec![ShingleRecord::new("doc-1", "aa", "альфа бета", 0, 10)];
//! store.store_shingles("doc-1", records).await.unwrap();
//!
//! let found = store
//!     .find_matching_shingles(&["aa".to_string()], "doc-2")
//!     .await
//!     .unwrap();
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].document_id, "doc-1");
//! # });
//! ```

mod backend;

#[cfg(feature = "backend-redb")]
pub use backend::RedbStore;
pub use backend::{BackendConfig, FingerprintStore, InMemoryStore};

use std::sync::Arc;

use bincode::config::standard;
use bincode::error::{DecodeError, EncodeError};
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zstd::{decode_all, encode_all};

/// Bump this value whenever the on-disk record batch layout changes.
pub const STORE_SCHEMA_VERSION: u16 = 1;

/// One persisted shingle of one document.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShingleRecord {
    pub document_id: String,
    pub hash: String,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl ShingleRecord {
    pub fn new(
        document_id: impl Into<String>,
        hash: impl Into<String>,
        text: impl Into<String>,
        start: usize,
        end: usize,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            hash: hash.into(),
            text: text.into(),
            start,
            end,
        }
    }
}

/// Rejects records that do not belong to `document_id`, have an empty hash
/// or an empty span. Runs before any backend I/O.
pub fn validate_records(document_id: &str, records: &[ShingleRecord]) -> Result<(), StoreError> {
    if document_id.trim().is_empty() {
        return Err(StoreError::malformed("document id is empty"));
    }
    for (idx, rec) in records.iter().enumerate() {
        if rec.document_id != document_id {
            return Err(StoreError::malformed(format!(
                "record {idx} belongs to {:?}, expected {document_id:?}",
                rec.document_id
            )));
        }
        if rec.hash.is_empty() {
            return Err(StoreError::malformed(format!("record {idx} has an empty hash")));
        }
        if rec.start >= rec.end {
            return Err(StoreError::malformed(format!(
                "record {idx} has an empty span [{}, {})",
                rec.start, rec.end
            )));
        }
    }
    Ok(())
}

/// Orders records by `(document_id, start)`, the order every backend
/// returns query results in.
pub(crate) fn sort_records(records: &mut [ShingleRecord]) {
    records.sort_by(|a, b| {
        a.document_id
            .cmp(&b.document_id)
            .then(a.start.cmp(&b.start))
            .then(a.end.cmp(&b.end))
    });
}

/// On-disk envelope for one document's records.
#[derive(Serialize, Deserialize, Debug)]
pub(crate) struct RecordBatch {
    pub schema_version: u16,
    pub records: Vec<ShingleRecord>,
}

/// Compression codec options for stored record batches.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionCodec {
    /// No compression (useful for debugging).
    None,
    /// Zstd compression (default, good balance of speed and ratio).
    #[default]
    Zstd,
}

/// Compression behavior configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressionConfig {
    pub codec: CompressionCodec,
    /// Compression level (1-22 for Zstd, higher is smaller but slower).
    pub level: i32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            codec: CompressionCodec::default(),
            level: 3,
        }
    }
}

impl CompressionConfig {
    pub fn new(codec: CompressionCodec, level: i32) -> Self {
        Self { codec, level }
    }

    pub fn with_codec(mut self, codec: CompressionCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, StoreError> {
        match self.codec {
            CompressionCodec::None => Ok(data.to_vec()),
            CompressionCodec::Zstd => Ok(encode_all(data, self.level)?),
        }
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, StoreError> {
        match self.codec {
            CompressionCodec::None => Ok(data.to_vec()),
            CompressionCodec::Zstd => Ok(decode_all(data)?),
        }
    }

    /// Encodes and compresses one document's records.
    pub(crate) fn encode_batch(&self, records: &[ShingleRecord]) -> Result<Vec<u8>, StoreError> {
        let batch = RecordBatch {
            schema_version: STORE_SCHEMA_VERSION,
            records: records.to_vec(),
        };
        let encoded = encode_to_vec(&batch, standard())?;
        self.compress(&encoded)
    }

    /// Decompresses and decodes one document's records.
    pub(crate) fn decode_batch(&self, data: &[u8]) -> Result<Vec<ShingleRecord>, StoreError> {
        let decompressed = self.decompress(data)?;
        let (batch, _): (RecordBatch, usize) = decode_from_slice(&decompressed, standard())?;
        if batch.schema_version != STORE_SCHEMA_VERSION {
            return Err(StoreError::Decode(format!(
                "unsupported schema version {}",
                batch.schema_version
            )));
        }
        Ok(batch.records)
    }
}

/// Config for building a fingerprint store.
#[derive(Clone, Debug, Default)]
pub struct StoreConfig {
    /// Backend selection (in-memory or redb).
    pub backend: BackendConfig,
    /// Compression settings for persisted record batches. Ignored by the
    /// in-memory backend.
    pub compression: CompressionConfig,
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(mut self, backend: BackendConfig) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_compression(mut self, compression: CompressionConfig) -> Self {
        self.compression = compression;
        self
    }

    /// Opens the configured backend.
    pub fn build(&self) -> Result<Arc<dyn FingerprintStore>, StoreError> {
        match &self.backend {
            BackendConfig::InMemory => Ok(Arc::new(InMemoryStore::new())),
            BackendConfig::Redb { path } => {
                #[cfg(feature = "backend-redb")]
                {
                    Ok(Arc::new(RedbStore::open(path, self.compression.clone())?))
                }
                #[cfg(not(feature = "backend-redb"))]
                {
                    let _ = path;
                    Err(StoreError::backend("redb backend disabled at compile time"))
                }
            }
        }
    }
}

/// Errors returned by fingerprint stores.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Serialization encode error: {0}")]
    Encode(String),
    #[error("Serialization decode error: {0}")]
    Decode(String),
    #[error("Compression error: {0}")]
    Zstd(String),
    #[error("Malformed records: {0}")]
    Malformed(String),
}

impl From<EncodeError> for StoreError {
    fn from(e: EncodeError) -> Self {
        StoreError::Encode(e.to_string())
    }
}

impl From<DecodeError> for StoreError {
    fn from(e: DecodeError) -> Self {
        StoreError::Decode(e.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Zstd(e.to_string())
    }
}

impl StoreError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }

    pub fn malformed<E: std::fmt::Display>(err: E) -> Self {
        Self::Malformed(err.to_string())
    }
}
