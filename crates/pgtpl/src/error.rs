//! Error types for pgtpl

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pgtpl operations
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Error types for template compilation, loading and execution
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Malformed template text (empty names, unbalanced loop tags, ...)
    #[error("Invalid template: {message} `{snippet}`")]
    InvalidTemplate { message: String, snippet: String },

    /// A parameter required by the template is not registered
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    /// A parameter has the wrong shape for how the template uses it
    #[error("Type mismatch for parameter '{name}': expected {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A fragment reference names no registered fragment
    #[error("Unknown fragment: {0}")]
    UnknownFragment(String),

    /// Template, fragment or row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rejected template source configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Reading a template file failed
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl TemplateError {
    /// Create an invalid template error carrying the offending raw text
    pub fn invalid_template(message: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            message: message.into(),
            snippet: snippet.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Check if this is an invalid template error
    pub fn is_invalid_template(&self) -> bool {
        matches!(self, Self::InvalidTemplate { .. })
    }

    /// Check if this is a missing parameter error
    pub fn is_missing_parameter(&self) -> bool {
        matches!(self, Self::MissingParameter(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a config error
    pub fn is_invalid_config(&self) -> bool {
        matches!(self, Self::InvalidConfig(_))
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for TemplateError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
