//! Metadata client error types

use std::time::Duration;
use thiserror::Error;

/// Metadata lookup specific error
#[derive(Debug, Error)]
pub enum MetadataError {
    /// HTTP client construction error
    #[error("failed to build metadata http client: {message}")]
    ClientBuild { message: String },

    /// Transport-level request error
    #[error("metadata request for '{field}' failed: {message}")]
    Http { field: String, message: String },

    /// Metadata server answered with a non-success status
    #[error("metadata server returned status {status} for '{field}'")]
    Service { field: String, status: u16 },

    /// Lookup exceeded the caller-supplied timeout
    #[error("metadata lookup for '{field}' timed out after {timeout_ms}ms")]
    Timeout { field: String, timeout_ms: u64 },

    /// Response body did not have the expected shape
    #[error("metadata value for '{field}' is malformed: {message}")]
    Malformed { field: String, message: String },
}

impl MetadataError {
    /// Create transport error
    pub fn http(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Http {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create malformed-response error
    pub fn malformed(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create timeout error
    pub fn timeout(field: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            field: field.into(),
            timeout_ms: timeout.as_millis() as u64,
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, MetadataError>;
