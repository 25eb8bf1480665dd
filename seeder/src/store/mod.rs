//! Document store collaborators
//!
//! The uploader only needs two calls from a store: resolve a named collection
//! and create a document in it. `FirestoreStore` talks to the Firestore REST
//! API; `InMemoryStore` keeps documents in process for dry runs.

pub mod firestore;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::source::ProjectRecord;

/// Store-assigned document identifier
pub type DocumentId = String;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid collection path: {0}")]
    InvalidCollection(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Store rejected the write with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected store response: {0}")]
    Decode(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Reference to a collection, e.g. `case_studies` or `clients/acme/projects`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRef {
    path: String,
}

impl CollectionRef {
    pub fn new(path: &str) -> StoreResult<Self> {
        let path = path.trim().trim_matches('/');
        if path.is_empty() {
            return Err(StoreError::InvalidCollection(
                "collection name cannot be empty".to_string(),
            ));
        }

        let segments: Vec<&str> = path.split('/').collect();
        if segments.iter().any(|segment| segment.trim().is_empty()) {
            return Err(StoreError::InvalidCollection(format!(
                "'{}' contains an empty path segment",
                path
            )));
        }
        // collection[/document/collection]*
        if segments.len() % 2 == 0 {
            return Err(StoreError::InvalidCollection(format!(
                "'{}' points at a document, not a collection",
                path
            )));
        }

        Ok(Self {
            path: path.to_string(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

impl std::fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}

/// A remote (or local) store of schemaless documents grouped in collections
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Obtain a reference to a named collection
    fn collection(&self, name: &str) -> StoreResult<CollectionRef> {
        CollectionRef::new(name)
    }

    /// Create a document with `record` as its body, returning the assigned id
    async fn add_document(
        &self,
        collection: &CollectionRef,
        record: &ProjectRecord,
    ) -> StoreResult<DocumentId>;

    /// Backend identifier for log lines
    fn backend(&self) -> &'static str;
}
