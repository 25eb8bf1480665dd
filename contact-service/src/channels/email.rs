use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

use crate::models::{ContactError, ContactMailer, ContactResult, ContactSubmission, OutgoingEmail};

const CONTACT_TEMPLATE: &str = "contact_submission";

/// Resend e-mail channel implementation
pub struct ResendChannel {
    http_client: Client,
    endpoint: String,
    api_key: String,
    from_address: String,
    to_address: String,
    template_engine: handlebars::Handlebars<'static>,
}

impl ResendChannel {
    /// Create a new Resend channel
    pub fn new(config: EmailConfig) -> Result<Self, ContactError> {
        if config.api_key.trim().is_empty() {
            return Err(ContactError::ConfigError("RESEND_API_KEY is not set".to_string()));
        }

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("portfolio-contact/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ContactError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        let mut template_engine = handlebars::Handlebars::new();
        template_engine
            .register_template_string(
                CONTACT_TEMPLATE,
                include_str!("../../templates/email/contact_submission.hbs"),
            )
            .map_err(|e| ContactError::TemplateError(format!("Failed to register template: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            from_address: config.from_address,
            to_address: config.to_address,
            template_engine,
        })
    }

    /// Build the message for a submission
    pub fn build_message(&self, submission: &ContactSubmission) -> ContactResult<OutgoingEmail> {
        let name = submission.name_text();
        let data = json!({
            "name": name,
            "email": submission.email_text(),
            "message": submission.message_text(),
        });

        let html = self
            .template_engine
            .render(CONTACT_TEMPLATE, &data)
            .map_err(|e| ContactError::TemplateError(format!("Failed to render template: {}", e)))?;
        let text = Self::html_to_text(&html);

        Ok(OutgoingEmail {
            from: self.from_address.clone(),
            to: vec![self.to_address.clone()],
            subject: format!("New message from {}", name),
            html,
            text,
            reply_to: Some(submission.email.clone()).filter(|email| !email.is_null()),
        })
    }

    /// Create plain text version from HTML
    fn html_to_text(html: &str) -> String {
        html.replace("<br>", "\n")
            .replace("<br/>", "\n")
            .replace("<br />", "\n")
            .replace("</h2>", "\n\n")
            .replace("</p>", "\n")
            // Remove all HTML tags
            .split('<')
            .enumerate()
            .filter_map(|(i, s)| {
                if i == 0 {
                    Some(s.to_string())
                } else {
                    s.split_once('>').map(|(_, text)| text.to_string())
                }
            })
            .collect::<Vec<String>>()
            .join("")
            .trim()
            .to_string()
    }

    async fn post_email(&self, email: &OutgoingEmail) -> ContactResult<Value> {
        let response = self
            .http_client
            .post(format!("{}/emails", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .await
            .map_err(|e| ContactError::SendError(format!("Email request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ContactError::SendError(format!("Failed to read provider response: {}", e)))?;

        if !status.is_success() {
            return Err(ContactError::ProviderError {
                status: status.as_u16(),
                message: provider_message(&body),
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body)
            .map_err(|e| ContactError::SendError(format!("Invalid provider response: {}", e)))
    }
}

#[async_trait]
impl ContactMailer for ResendChannel {
    async fn send_contact(&self, submission: &ContactSubmission) -> ContactResult<Value> {
        let email = self.build_message(submission)?;

        info!(
            "Sending contact email to {} with reply-to {}",
            self.to_address,
            submission.email_text()
        );

        match self.post_email(&email).await {
            Ok(data) => {
                info!("Contact email accepted by provider");
                Ok(data)
            }
            // Reported once by the handler
            Err(e) => {
                debug!("Contact email was not accepted: {}", e);
                Err(e)
            }
        }
    }

    fn provider(&self) -> &'static str {
        "resend"
    }
}

fn provider_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ProviderError {
        message: String,
    }

    serde_json::from_str::<ProviderError>(body)
        .map(|error| error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub api_key: String,
    pub endpoint: String,
    pub from_address: String,
    pub to_address: String,
    pub timeout_seconds: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: "https://api.resend.com".to_string(),
            from_address: "AniDesignIt <onboarding@resend.dev>".to_string(),
            to_address: "anidesignit@gmail.com".to_string(),
            timeout_seconds: 15,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use pretty_assertions::assert_eq;

    fn channel_for(endpoint: String) -> ResendChannel {
        ResendChannel::new(EmailConfig {
            api_key: "re_test".to_string(),
            endpoint,
            ..Default::default()
        })
        .unwrap()
    }

    fn submission() -> ContactSubmission {
        ContactSubmission {
            name: json!("Dana"),
            email: json!("Dana.Client+site@Example.com"),
            message: json!("Loved the checkout case study."),
        }
    }

    #[test]
    fn test_html_to_text() {
        let html = "<h2>Title</h2><p>Hello <strong>World</strong></p><br/><p>Test</p>";
        let text = ResendChannel::html_to_text(html);
        assert!(text.contains("Hello"));
        assert!(text.contains("World"));
        assert!(!text.contains("<p>"));
    }

    #[test]
    fn test_missing_api_key() {
        assert!(matches!(
            ResendChannel::new(EmailConfig::default()),
            Err(ContactError::ConfigError(_))
        ));
    }

    #[test]
    fn test_build_message_uses_fixed_addresses() {
        let channel = channel_for("http://localhost".to_string());
        let message = channel.build_message(&submission()).unwrap();

        assert_eq!(message.from, "AniDesignIt <onboarding@resend.dev>");
        assert_eq!(message.to, vec!["anidesignit@gmail.com".to_string()]);
        assert_eq!(message.subject, "New message from Dana");
        assert_eq!(message.reply_to, Some(json!("Dana.Client+site@Example.com")));
        assert!(message.html.contains("<p><strong>Name:</strong> Dana</p>"));
        assert!(message.text.contains("Loved the checkout case study."));
    }

    #[test]
    fn test_build_message_escapes_html_and_omits_missing_reply_to() {
        let channel = channel_for("http://localhost".to_string());
        let message = channel
            .build_message(&ContactSubmission {
                name: json!("<script>alert(1)</script>"),
                ..Default::default()
            })
            .unwrap();

        assert!(!message.html.contains("<script>"));
        assert!(message.html.contains("&lt;script&gt;"));

        let payload = serde_json::to_value(&message).unwrap();
        assert!(payload.get("reply_to").is_none());
    }

    #[test]
    fn test_build_message_stringifies_non_string_fields() {
        let channel = channel_for("http://localhost".to_string());
        let message = channel
            .build_message(&ContactSubmission {
                name: json!(42),
                email: json!(["a@b.com"]),
                message: json!({"body": "hi"}),
            })
            .unwrap();

        assert_eq!(message.subject, "New message from 42");
        assert!(message.html.contains("<strong>Name:</strong> 42"));
        assert_eq!(message.reply_to, Some(json!(["a@b.com"])));
    }

    #[tokio::test]
    async fn test_send_contact_posts_to_resend() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/emails")
            .match_header("authorization", "Bearer re_test")
            .match_body(Matcher::PartialJson(json!({
                "from": "AniDesignIt <onboarding@resend.dev>",
                "to": ["anidesignit@gmail.com"],
                "subject": "New message from Dana",
                "reply_to": "Dana.Client+site@Example.com"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "49a3999c-0ce1-4ea6-ab68-afcd6dc2e794"}"#)
            .create_async()
            .await;

        let channel = channel_for(server.url());
        let data = channel.send_contact(&submission()).await.unwrap();

        assert_eq!(data, json!({"id": "49a3999c-0ce1-4ea6-ab68-afcd6dc2e794"}));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_contact_surfaces_provider_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/emails")
            .with_status(422)
            .with_header("content-type", "application/json")
            .with_body(r#"{"statusCode": 422, "message": "Invalid `reply_to` field.", "name": "validation_error"}"#)
            .create_async()
            .await;

        let channel = channel_for(server.url());
        let result = channel.send_contact(&submission()).await;

        match result {
            Err(ContactError::ProviderError { status, message }) => {
                assert_eq!(status, 422);
                assert_eq!(message, "Invalid `reply_to` field.");
            }
            other => panic!("expected provider error, got {:?}", other),
        }
    }
}
