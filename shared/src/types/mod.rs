//! Shared type definitions for the portfolio backend tools
//!
//! - `case_study`: the explicit schema a Project Record can be checked against
//! - `common`: the JSON response envelope returned by HTTP endpoints

pub mod case_study;
pub mod common;

pub use case_study::{CaseStudy, MediaRef, SchemaError, ToolEntry};
pub use common::ApiEnvelope;
