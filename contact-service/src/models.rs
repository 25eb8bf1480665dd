use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Result type for contact operations
pub type ContactResult<T> = Result<T, ContactError>;

/// Contact error types
#[derive(Debug, Error)]
pub enum ContactError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid request body: {0}")]
    InvalidRequest(String),

    #[error("Template error: {0}")]
    TemplateError(String),

    #[error("Send error: {0}")]
    SendError(String),

    #[error("Email provider returned {status}: {message}")]
    ProviderError { status: u16, message: String },
}

/// Contact form body as posted by the site
///
/// Fields are forwarded as given; nothing is validated. Any JSON value is
/// accepted for each of them, and a body that is not an object simply has no
/// fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContactSubmission {
    pub name: Value,
    pub email: Value,
    pub message: Value,
}

impl ContactSubmission {
    pub fn from_json(body: &Value) -> Self {
        let field = |key: &str| body.get(key).cloned().unwrap_or(Value::Null);
        Self {
            name: field("name"),
            email: field("email"),
            message: field("message"),
        }
    }

    pub fn name_text(&self) -> String {
        display_text(&self.name)
    }

    pub fn email_text(&self) -> String {
        display_text(&self.email)
    }

    pub fn message_text(&self) -> String {
        display_text(&self.message)
    }
}

// Strings as-is, null as empty, anything else as its JSON text
fn display_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Message handed to the e-mail provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<Value>,
}

/// Delivers contact form submissions
#[async_trait]
pub trait ContactMailer: Send + Sync {
    /// Send the submission, returning the provider's response payload
    async fn send_contact(&self, submission: &ContactSubmission) -> ContactResult<Value>;

    /// Provider identifier
    fn provider(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_submission_keeps_any_json_value() {
        let submission = ContactSubmission::from_json(&json!({
            "name": 42,
            "email": "d@e.com",
            "message": {"body": "hi"},
            "extra": true
        }));

        assert_eq!(submission.name, json!(42));
        assert_eq!(submission.name_text(), "42");
        assert_eq!(submission.email_text(), "d@e.com");
        assert_eq!(submission.message_text(), r#"{"body":"hi"}"#);
    }

    #[test]
    fn test_submission_from_non_object_has_no_fields() {
        let submission = ContactSubmission::from_json(&json!(["Dana", "d@e.com"]));
        assert_eq!(submission, ContactSubmission::default());
        assert_eq!(submission.name_text(), "");
    }
}
