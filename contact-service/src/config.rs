use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::channels::EmailConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub email: EmailConfig,
    pub log_format: String,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        Ok(Self {
            server: ServerConfig {
                host: var("SERVER_HOST", &defaults.server.host),
                port: var("SERVER_PORT", &defaults.server.port.to_string())
                    .parse()
                    .context("SERVER_PORT must be a port number")?,
                max_body_bytes: var("MAX_BODY_BYTES", &defaults.server.max_body_bytes.to_string())
                    .parse()
                    .context("MAX_BODY_BYTES must be a byte count")?,
            },
            email: EmailConfig {
                api_key: lookup("RESEND_API_KEY").context("RESEND_API_KEY must be set")?,
                endpoint: var("RESEND_ENDPOINT", &defaults.email.endpoint),
                from_address: var("EMAIL_FROM_ADDRESS", &defaults.email.from_address),
                to_address: var("EMAIL_TO_ADDRESS", &defaults.email.to_address),
                timeout_seconds: var("EMAIL_TIMEOUT", &defaults.email.timeout_seconds.to_string())
                    .parse()
                    .context("EMAIL_TIMEOUT must be a number of seconds")?,
            },
            log_format: var("LOG_FORMAT", &defaults.log_format),
            log_level: var("LOG_LEVEL", &defaults.log_level),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8085,
                max_body_bytes: 64 * 1024,
            },
            email: EmailConfig::default(),
            log_format: "json".to_string(),
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
    }

    #[test]
    fn test_missing_api_key_is_named() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert_eq!(err.to_string(), "RESEND_API_KEY must be set");
    }

    #[test]
    fn test_from_lookup_uses_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("RESEND_API_KEY", "re_live"),
            ("LOG_LEVEL", "debug"),
        ]))
        .unwrap();

        assert_eq!(config.email.api_key, "re_live");
        assert_eq!(config.email.to_address, "anidesignit@gmail.com");
        assert_eq!(config.server.port, 8085);
        assert_eq!(config.server.max_body_bytes, 64 * 1024);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_invalid_port() {
        let err = Config::from_lookup(lookup_from(&[
            ("RESEND_API_KEY", "re_live"),
            ("SERVER_PORT", "http"),
        ]))
        .unwrap_err();
        assert_eq!(err.to_string(), "SERVER_PORT must be a port number");
    }
}
