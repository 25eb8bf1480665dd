//! Loading the record collection from the static JSON source

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Top-level key '{0}' not found in input")]
    MissingKey(String),

    #[error("Top-level key '{key}' must map to an object, found {found}")]
    NotAnObject { key: String, found: &'static str },
}

/// One case study, kept exactly as it appeared in the source
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRecord(Value);

impl ProjectRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Human-readable name for log lines, if the record carries one
    pub fn name(&self) -> Option<&str> {
        ["name", "Title", "title"]
            .iter()
            .find_map(|field| self.0.get(*field).and_then(Value::as_str))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for ProjectRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Named records in the order the source object lists them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordCollection {
    entries: Vec<(String, ProjectRecord)>,
}

impl RecordCollection {
    /// Read `path` and take the object stored under `top_level_key`
    pub fn load(path: &Path, top_level_key: &str) -> Result<Self, SourceError> {
        let contents = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents, top_level_key)
    }

    pub fn from_json_str(contents: &str, top_level_key: &str) -> Result<Self, SourceError> {
        let document: Value = serde_json::from_str(contents)?;
        let records = match document.get(top_level_key) {
            Some(Value::Object(records)) => records.clone(),
            Some(other) => {
                return Err(SourceError::NotAnObject {
                    key: top_level_key.to_string(),
                    found: json_kind(other),
                })
            }
            None => return Err(SourceError::MissingKey(top_level_key.to_string())),
        };

        let collection = Self::from_map(records);
        debug!(records = collection.len(), key = top_level_key, "Parsed record collection");
        Ok(collection)
    }

    pub fn from_map(records: Map<String, Value>) -> Self {
        Self {
            entries: records
                .into_iter()
                .map(|(key, value)| (key, ProjectRecord(value)))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProjectRecord)> {
        self.entries.iter().map(|(key, record)| (key.as_str(), record))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
