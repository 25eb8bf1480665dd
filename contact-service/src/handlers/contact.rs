use axum::{body::Body, extract::State, http::StatusCode, response::Json};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use shared::ApiEnvelope;

use crate::models::{ContactError, ContactResult, ContactSubmission};
use crate::AppState;

/// Forward a contact form submission to the mail provider
///
/// The body is read and parsed by hand so that oversized or malformed bodies
/// are reported through the same 500 envelope as delivery failures.
pub async fn send_email(
    State(state): State<Arc<AppState>>,
    body: Body,
) -> (StatusCode, Json<ApiEnvelope<Value>>) {
    match deliver(&state, body).await {
        Ok(data) => (StatusCode::OK, Json(ApiEnvelope::success(data))),
        Err(e) => {
            error!("Email error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiEnvelope::failure(e.to_string())),
            )
        }
    }
}

async fn deliver(state: &AppState, body: Body) -> ContactResult<Value> {
    let limit = state.config.server.max_body_bytes;
    let bytes = axum::body::to_bytes(body, limit).await.map_err(|_| {
        ContactError::InvalidRequest(format!("body exceeds {} bytes or could not be read", limit))
    })?;
    let json: Value = serde_json::from_slice(&bytes)
        .map_err(|e| ContactError::InvalidRequest(e.to_string()))?;
    let submission = ContactSubmission::from_json(&json);

    info!(
        provider = state.mailer.provider(),
        "Contact form submitted by {}",
        submission.email_text()
    );

    state.mailer.send_contact(&submission).await
}
