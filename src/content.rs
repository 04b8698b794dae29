//! Where document text comes from.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use crate::service::ServiceError;

/// Source of raw document text by document id.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    async fn get_content(&self, document_id: &str) -> Result<String, ServiceError>;
}

/// Documents held in memory, mostly for tests and embedding.
#[derive(Default)]
pub struct InMemoryContentProvider {
    documents: RwLock<HashMap<String, String>>,
}

impl InMemoryContentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, document_id: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(document_id, content);
        self
    }

    /// Add or replace a document.
    pub fn insert(&self, document_id: impl Into<String>, content: impl Into<String>) {
        let mut guard = self
            .documents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.insert(document_id.into(), content.into());
    }
}

#[async_trait]
impl ContentProvider for InMemoryContentProvider {
    async fn get_content(&self, document_id: &str) -> Result<String, ServiceError> {
        let guard = self
            .documents
            .read()
            .map_err(|_| ServiceError::Repository("poisoned lock".into()))?;
        guard
            .get(document_id)
            .cloned()
            .ok_or_else(|| ServiceError::ContentNotFound(document_id.to_string()))
    }
}

/// Reads `<root>/<document_id>` as UTF-8 text.
///
/// Ids that would escape `root` (absolute paths, `..`, nested
/// directories) are rejected with [`ServiceError::InvalidDocumentId`].
#[derive(Debug, Clone)]
pub struct FsContentProvider {
    root: PathBuf,
}

impl FsContentProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, document_id: &str) -> Result<PathBuf, ServiceError> {
        let mut components = Path::new(document_id).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => Ok(self.root.join(name)),
            _ => Err(ServiceError::InvalidDocumentId(document_id.to_string())),
        }
    }
}

#[async_trait]
impl ContentProvider for FsContentProvider {
    async fn get_content(&self, document_id: &str) -> Result<String, ServiceError> {
        let path = self.resolve(document_id)?;
        debug!(document_id, path = %path.display(), "reading_content");
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => ServiceError::ContentNotFound(document_id.to_string()),
                ErrorKind::InvalidData => ServiceError::InvalidContent(document_id.to_string()),
                _ => ServiceError::ContentRead {
                    document_id: document_id.to_string(),
                    source: err,
                },
            })
    }
}
