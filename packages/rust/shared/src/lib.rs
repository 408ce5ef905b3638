//! Shared types, error model, and configuration for FieldScope.
//!
//! This crate is the foundation depended on by all other FieldScope crates.
//! It provides:
//! - [`FieldscopeError`] — the unified error type
//! - Domain types ([`ClassificationRequest`], [`Candidate`], [`Feedback`],
//!   [`ValidationReport`], [`Satisfaction`], [`Level`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, GeminiConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from, validate_api_key,
};
pub use error::{FieldscopeError, Result};
pub use types::{
    Candidate, ClassificationRequest, Feedback, Level, PLACEHOLDER_SCORE, RequestId, Satisfaction,
    ValidationReport,
};
