use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;

use super::{CollectionRef, DocumentId, DocumentStore, StoreError, StoreResult};
use crate::source::ProjectRecord;

/// A document held by [`InMemoryStore`]
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub collection: String,
    pub id: DocumentId,
    pub body: Value,
}

/// Process-local document store, used for dry runs
#[derive(Debug, Default)]
pub struct InMemoryStore {
    documents: Mutex<Vec<StoredDocument>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored document in creation order
    pub fn documents(&self) -> Vec<StoredDocument> {
        self.documents
            .lock()
            .map(|documents| documents.clone())
            .unwrap_or_default()
    }

    pub fn documents_in(&self, collection: &str) -> Vec<StoredDocument> {
        self.documents()
            .into_iter()
            .filter(|document| document.collection == collection)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.documents.lock().map(|documents| documents.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn add_document(
        &self,
        collection: &CollectionRef,
        record: &ProjectRecord,
    ) -> StoreResult<DocumentId> {
        if !record.as_value().is_object() {
            return Err(StoreError::InvalidDocument(
                "document body must be a JSON object".to_string(),
            ));
        }

        // Same length as Firestore auto-ids
        let id: DocumentId = uuid::Uuid::new_v4().simple().to_string()[..20].to_string();

        let mut documents = self
            .documents
            .lock()
            .map_err(|_| StoreError::Unavailable("document lock poisoned".to_string()))?;
        documents.push(StoredDocument {
            collection: collection.path().to_string(),
            id: id.clone(),
            body: record.as_value().clone(),
        });

        Ok(id)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
