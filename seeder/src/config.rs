use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::uploader::FailurePolicy;

pub const DEFAULT_FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_DATABASE_ID: &str = "(default)";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub firebase: FirebaseConfig,
    pub input: InputConfig,
    pub upload: UploadConfig,
}

/// Connection block for the Firebase project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub auth_domain: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub messaging_sender_id: String,
    pub app_id: String,
    pub database_id: String,
    pub endpoint: String,
    /// OAuth2 token sent as a bearer header in addition to the API key
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub path: PathBuf,
    pub top_level_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub collection: String,
    pub failure_policy: FailurePolicy,
    pub validate_schema: bool,
    pub request_timeout_seconds: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from any variable source, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        // The emulator speaks plain HTTP and ignores credentials
        let endpoint = match lookup("FIRESTORE_EMULATOR_HOST") {
            Some(host) if !host.trim().is_empty() => format!("http://{}/v1", host.trim()),
            _ => var("FIRESTORE_ENDPOINT", &defaults.firebase.endpoint),
        };

        Ok(Config {
            firebase: FirebaseConfig {
                api_key: var("FIREBASE_API_KEY", ""),
                auth_domain: var("FIREBASE_AUTH_DOMAIN", ""),
                project_id: var("FIREBASE_PROJECT_ID", ""),
                storage_bucket: var("FIREBASE_STORAGE_BUCKET", ""),
                messaging_sender_id: var("FIREBASE_MESSAGING_SENDER_ID", ""),
                app_id: var("FIREBASE_APP_ID", ""),
                database_id: var("FIRESTORE_DATABASE_ID", DEFAULT_DATABASE_ID),
                endpoint,
                access_token: lookup("FIRESTORE_ACCESS_TOKEN").filter(|token| !token.is_empty()),
            },
            input: InputConfig {
                path: lookup("SEED_INPUT_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.input.path),
                top_level_key: var("SEED_TOP_LEVEL_KEY", &defaults.input.top_level_key),
            },
            upload: UploadConfig {
                collection: var("SEED_COLLECTION", &defaults.upload.collection),
                failure_policy: parse_var(&lookup, "SEED_FAILURE_POLICY", defaults.upload.failure_policy)?,
                validate_schema: parse_var(&lookup, "SEED_VALIDATE_SCHEMA", defaults.upload.validate_schema)?,
                request_timeout_seconds: parse_var(
                    &lookup,
                    "SEED_REQUEST_TIMEOUT",
                    defaults.upload.request_timeout_seconds,
                )?,
            },
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path.to_path_buf()))?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validate the input and upload sections
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.top_level_key.trim().is_empty() {
            return Err(ConfigError::InvalidConfig("Top-level key cannot be empty".to_string()));
        }

        if self.upload.collection.trim().is_empty() {
            return Err(ConfigError::InvalidConfig("Collection name cannot be empty".to_string()));
        }

        if self.upload.request_timeout_seconds == 0 {
            return Err(ConfigError::InvalidConfig("Request timeout must be > 0".to_string()));
        }

        Ok(())
    }
}

impl FirebaseConfig {
    pub fn is_emulator(&self) -> bool {
        self.endpoint.starts_with("http://")
    }

    /// Validate the connection block before talking to Firestore
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project_id.trim().is_empty() {
            return Err(ConfigError::MissingValue("FIREBASE_PROJECT_ID"));
        }

        if self.database_id.trim().is_empty() {
            return Err(ConfigError::InvalidConfig("Database id cannot be empty".to_string()));
        }

        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(ConfigError::InvalidConfig(format!(
                "Firestore endpoint must be an http(s) URL: {}",
                self.endpoint
            )));
        }

        let has_credentials = !self.api_key.trim().is_empty() || self.access_token.is_some();
        if !has_credentials && !self.is_emulator() {
            return Err(ConfigError::MissingValue("FIREBASE_API_KEY"));
        }

        Ok(())
    }
}

impl Default for FirebaseConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            auth_domain: String::new(),
            project_id: String::new(),
            storage_bucket: String::new(),
            messaging_sender_id: String::new(),
            app_id: String::new(),
            database_id: DEFAULT_DATABASE_ID.to_string(),
            endpoint: DEFAULT_FIRESTORE_ENDPOINT.to_string(),
            access_token: None,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("case_studies.json"),
            top_level_key: "case_studies".to_string(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            collection: "case_studies".to_string(),
            failure_policy: FailurePolicy::FailFast,
            validate_schema: false,
            request_timeout_seconds: 30,
        }
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            name,
            value: raw,
        }),
        None => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required setting {0}")]
    MissingValue(&'static str),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
