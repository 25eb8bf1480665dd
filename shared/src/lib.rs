//! Shared utilities and types for the portfolio backend tools

// Re-export common dependencies
pub use anyhow;
pub use serde;
pub use serde_json;
pub use thiserror;
pub use tracing;

pub mod observability;
pub mod types;

pub use types::{ApiEnvelope, CaseStudy, MediaRef, ToolEntry};
