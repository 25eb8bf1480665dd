//! Case study seeder
//!
//! Reads a collection of project records from a static JSON file and creates
//! one document per record in a document store, one request at a time.

pub mod config;
pub mod source;
pub mod store;
pub mod uploader;

pub use config::{Config, ConfigError, FirebaseConfig, InputConfig, UploadConfig};
pub use source::{ProjectRecord, RecordCollection, SourceError};
pub use store::{
    firestore::FirestoreStore, memory::InMemoryStore, CollectionRef, DocumentId, DocumentStore,
    StoreError, StoreResult,
};
pub use uploader::{
    BatchUploader, FailedRecord, FailurePolicy, UploadError, UploadOutcome, UploadReport,
    UploadedRecord,
};
