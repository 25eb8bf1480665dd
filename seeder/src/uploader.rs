//! Batch uploader
//!
//! Walks a record collection once, in source order, and creates one document
//! per record. Each create is awaited before the next one starts. There is no
//! idempotency key: running twice over the same input creates every document
//! twice.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use shared::CaseStudy;

use crate::source::RecordCollection;
use crate::store::{CollectionRef, DocumentId, DocumentStore, StoreError};

/// What to do when a single create call fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop at the first failed record; later records are never attempted
    #[default]
    FailFast,
    /// Record the failure and move on to the next record
    ContinueOnError,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "fail-fast" => Ok(FailurePolicy::FailFast),
            "continue-on-error" | "continue" => Ok(FailurePolicy::ContinueOnError),
            other => Err(format!("unknown failure policy: {}", other)),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::FailFast => f.write_str("fail-fast"),
            FailurePolicy::ContinueOnError => f.write_str("continue-on-error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadedRecord {
    pub key: String,
    pub name: Option<String>,
    pub document_id: DocumentId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FailedRecord {
    pub key: String,
    pub name: Option<String>,
    pub error: String,
}

/// Result of one create call
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Succeeded(UploadedRecord),
    Failed(FailedRecord),
}

/// Aggregate of every outcome in a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadReport {
    pub succeeded: Vec<UploadedRecord>,
    pub failed: Vec<FailedRecord>,
}

impl UploadReport {
    pub fn record(&mut self, outcome: UploadOutcome) {
        match outcome {
            UploadOutcome::Succeeded(uploaded) => self.succeeded.push(uploaded),
            UploadOutcome::Failed(failed) => self.failed.push(failed),
        }
    }

    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaFailure {
    pub key: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(
        "upload aborted at record '{key}' ({position} of {total}, {} already uploaded)",
        .report.succeeded.len()
    )]
    Aborted {
        key: String,
        position: usize,
        total: usize,
        report: UploadReport,
        #[source]
        source: StoreError,
    },

    #[error("{} record(s) failed schema validation: {}", .failures.len(), describe_failures(.failures))]
    SchemaRejected { failures: Vec<SchemaFailure> },

    #[error(transparent)]
    Store(#[from] StoreError),
}

fn describe_failures(failures: &[SchemaFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("{} ({})", failure.key, failure.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Uploads a record collection into one collection of a document store
pub struct BatchUploader<'a> {
    store: &'a dyn DocumentStore,
    collection: CollectionRef,
    policy: FailurePolicy,
    validate_schema: bool,
}

impl<'a> BatchUploader<'a> {
    pub fn new(store: &'a dyn DocumentStore, collection: &str) -> Result<Self, UploadError> {
        let collection = store.collection(collection)?;
        Ok(Self {
            store,
            collection,
            policy: FailurePolicy::default(),
            validate_schema: false,
        })
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Check every record against the case study schema before the first write
    pub fn with_schema_validation(mut self, enabled: bool) -> Self {
        self.validate_schema = enabled;
        self
    }

    pub fn collection(&self) -> &CollectionRef {
        &self.collection
    }

    /// Create one document per record, strictly in order
    pub async fn run(&self, records: &RecordCollection) -> Result<UploadReport, UploadError> {
        let total = records.len();
        info!(
            collection = %self.collection,
            backend = self.store.backend(),
            policy = %self.policy,
            "Found {} projects to upload.",
            total
        );

        if self.validate_schema {
            self.preflight(records)?;
        }

        let mut report = UploadReport::default();
        for (index, (key, record)) in records.iter().enumerate() {
            let name = record.name().map(str::to_string);
            let label = name.clone().unwrap_or_else(|| key.to_string());

            match self.store.add_document(&self.collection, record).await {
                Ok(document_id) => {
                    info!(key, document_id = %document_id, "Successfully uploaded: {}", label);
                    report.record(UploadOutcome::Succeeded(UploadedRecord {
                        key: key.to_string(),
                        name,
                        document_id,
                    }));
                }
                // Logged once by the caller
                Err(source) if self.policy == FailurePolicy::FailFast => {
                    return Err(UploadError::Aborted {
                        key: key.to_string(),
                        position: index + 1,
                        total,
                        report,
                        source,
                    });
                }
                Err(source) => {
                    error!(key, "Failed to upload {}: {}", label, source);
                    report.record(UploadOutcome::Failed(FailedRecord {
                        key: key.to_string(),
                        name,
                        error: source.to_string(),
                    }));
                }
            }
        }

        if report.is_clean() {
            info!(
                "All {} projects have been successfully uploaded to {}",
                report.succeeded.len(),
                self.collection
            );
        } else {
            warn!(
                "Uploaded {} of {} projects; {} failed: {}",
                report.succeeded.len(),
                total,
                report.failed.len(),
                report
                    .failed
                    .iter()
                    .map(|failed| failed.key.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        Ok(report)
    }

    fn preflight(&self, records: &RecordCollection) -> Result<(), UploadError> {
        let failures: Vec<SchemaFailure> = records
            .iter()
            .filter_map(|(key, record)| {
                CaseStudy::from_value(record.as_value())
                    .err()
                    .map(|error| SchemaFailure {
                        key: key.to_string(),
                        reason: error.to_string(),
                    })
            })
            .collect();

        if failures.is_empty() {
            debug!("All {} records match the case study schema", records.len());
            Ok(())
        } else {
            Err(UploadError::SchemaRejected { failures })
        }
    }
}
