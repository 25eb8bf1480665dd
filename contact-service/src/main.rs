mod channels;
mod config;
mod handlers;
mod models;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultOnFailure, TraceLayer},
};
use tracing::{info, Level};

use crate::channels::ResendChannel;
use crate::config::Config;
use crate::models::ContactMailer;
use shared::observability::{init_service_logging, LogFormat, LogLevel};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    let log_format: LogFormat = config.log_format.parse()?;
    let log_level: LogLevel = config.log_level.parse()?;
    init_service_logging("contact-service", log_format, log_level)?;

    info!("Starting Contact Service...");
    info!("Configuration loaded successfully");

    // Initialize mail channel
    let mailer: Arc<dyn ContactMailer> = Arc::new(ResendChannel::new(config.email.clone())?);
    info!("Email channel initialized ({})", mailer.provider());

    // Build application state
    let app_state = Arc::new(AppState {
        config: config.clone(),
        mailer,
    });

    let app = router(app_state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Contact Service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Failed sends are already logged as errors by the handler
    let trace = TraceLayer::new_for_http().on_failure(DefaultOnFailure::new().level(Level::WARN));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/send-email", post(handlers::contact::send_email))
        .layer(cors)
        .layer(trace)
        .with_state(state)
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub mailer: Arc<dyn ContactMailer>,
}
