//! Firestore REST client
//!
//! Creates documents through `documents.createDocument`, letting Firestore
//! assign the id. Bodies are converted from plain JSON into Firestore's typed
//! `Value` representation before sending.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::debug;

use super::{CollectionRef, DocumentId, DocumentStore, StoreError, StoreResult};
use crate::config::FirebaseConfig;
use crate::source::ProjectRecord;

pub struct FirestoreStore {
    http_client: Client,
    documents_url: String,
    api_key: Option<String>,
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedDocument {
    name: String,
}

impl FirestoreStore {
    /// Create a client for the project described by `config`
    pub fn new(config: &FirebaseConfig, timeout: Duration) -> StoreResult<Self> {
        config
            .validate()
            .map_err(|e| StoreError::Config(e.to_string()))?;

        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("case-study-seeder/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoreError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let documents_url = format!(
            "{}/projects/{}/databases/{}/documents",
            config.endpoint.trim_end_matches('/'),
            config.project_id,
            config.database_id
        );

        debug!("Firestore documents endpoint: {}", documents_url);

        Ok(Self {
            http_client,
            documents_url,
            api_key: Some(config.api_key.clone()).filter(|key| !key.trim().is_empty()),
            access_token: config.access_token.clone(),
        })
    }

    fn collection_url(&self, collection: &CollectionRef) -> String {
        format!("{}/{}", self.documents_url, collection.path())
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn add_document(
        &self,
        collection: &CollectionRef,
        record: &ProjectRecord,
    ) -> StoreResult<DocumentId> {
        let body = encode_document(record.as_value())?;

        let mut request = self.http_client.post(self.collection_url(collection)).json(&body);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        let response_body = response
            .text()
            .await
            .map_err(|e| StoreError::Transport(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message: error_message(&response_body),
            });
        }

        let created: CreatedDocument = serde_json::from_str(&response_body)
            .map_err(|e| StoreError::Decode(format!("{}: {}", e, response_body)))?;

        document_id_from_name(&created.name)
            .map(str::to_string)
            .ok_or_else(|| StoreError::Decode(format!("No document id in name '{}'", created.name)))
    }

    fn backend(&self) -> &'static str {
        "firestore"
    }
}

/// Wrap a JSON object as a Firestore `Document` body
pub fn encode_document(value: &Value) -> StoreResult<Value> {
    match value {
        Value::Object(fields) => Ok(json!({ "fields": encode_fields(fields)? })),
        Value::Null => Err(StoreError::InvalidDocument(
            "document body must be a JSON object, found null".to_string(),
        )),
        _ => Err(StoreError::InvalidDocument(format!(
            "document body must be a JSON object, found {}",
            value
        ))),
    }
}

fn encode_fields(fields: &Map<String, Value>) -> StoreResult<Map<String, Value>> {
    let mut encoded = Map::with_capacity(fields.len());
    for (name, value) in fields {
        if name.is_empty() {
            return Err(StoreError::InvalidDocument("field names cannot be empty".to_string()));
        }
        encoded.insert(name.clone(), encode_value(value, false)?);
    }
    Ok(encoded)
}

fn encode_value(value: &Value, inside_array: bool) -> StoreResult<Value> {
    let encoded = match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(flag) => json!({ "booleanValue": flag }),
        Value::Number(number) => {
            // int64 travels as a decimal string
            if let Some(integer) = number.as_i64() {
                json!({ "integerValue": integer.to_string() })
            } else if number.is_u64() {
                return Err(StoreError::InvalidDocument(format!(
                    "integer {} does not fit in a 64-bit signed integer",
                    number
                )));
            } else if let Some(double) = number.as_f64() {
                json!({ "doubleValue": double })
            } else {
                return Err(StoreError::InvalidDocument(format!(
                    "unsupported number {}",
                    number
                )));
            }
        }
        Value::String(text) => json!({ "stringValue": text }),
        Value::Array(items) => {
            if inside_array {
                return Err(StoreError::InvalidDocument(
                    "nested arrays are not supported".to_string(),
                ));
            }
            let values = items
                .iter()
                .map(|item| encode_value(item, true))
                .collect::<StoreResult<Vec<_>>>()?;
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(fields) => json!({ "mapValue": { "fields": encode_fields(fields)? } }),
    };
    Ok(encoded)
}

/// `projects/p/databases/(default)/documents/case_studies/AbC` -> `AbC`
pub fn document_id_from_name(name: &str) -> Option<&str> {
    name.rsplit('/').next().filter(|id| !id.is_empty() && *id != name)
}

fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorEnvelope {
        error: ErrorDetail,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        message: String,
        #[serde(default)]
        status: Option<String>,
    }

    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.status {
            Some(status) => format!("{} ({})", envelope.error.message, status),
            None => envelope.error.message,
        },
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}
