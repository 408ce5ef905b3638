//! Error types for FieldScope.
//!
//! Library crates use [`FieldscopeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Two of the variants carry pipeline semantics beyond their message:
//! [`FieldscopeError::ScopeNotFound`] and [`FieldscopeError::LlmUnavailable`]
//! are fatal for a classification run and unwind straight to the caller.
//! Malformed model output is *not* represented here at the pipeline boundary —
//! stages absorb it locally (empty proposal or structural fallback) and it
//! surfaces only as data.

use std::path::PathBuf;

/// Top-level error type for all FieldScope operations.
#[derive(Debug, thiserror::Error)]
pub enum FieldscopeError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A scope path segment (college, unit, or field) is absent from the
    /// taxonomy. Fatal: this is a caller configuration error, never retried.
    #[error("scope not found: {segment}")]
    ScopeNotFound { segment: String },

    /// The classification capability is unreachable or not configured where
    /// required. Fatal for the run.
    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    /// The model's structured output failed schema validation. Recoverable;
    /// stages map this to an empty proposal or a structural-only verdict.
    #[error("malformed LLM response: {0}")]
    MalformedResponse(String),

    /// Network/HTTP error talking to the model provider.
    #[error("network error: {0}")]
    Network(String),

    /// Taxonomy file content error (bad JSON shape, unexpected nesting).
    #[error("taxonomy error: {message}")]
    Taxonomy { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FieldscopeError>;

impl FieldscopeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a scope-not-found error naming the offending path segment.
    pub fn scope_not_found(segment: impl Into<String>) -> Self {
        Self::ScopeNotFound {
            segment: segment.into(),
        }
    }

    /// Create a taxonomy content error from any displayable message.
    pub fn taxonomy(msg: impl Into<String>) -> Self {
        Self::Taxonomy {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = FieldscopeError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = FieldscopeError::scope_not_found("college 'Hogwarts'");
        assert_eq!(err.to_string(), "scope not found: college 'Hogwarts'");

        let err = FieldscopeError::LlmUnavailable("no client configured".into());
        assert!(err.to_string().contains("no client configured"));
    }
}
