//! Enricher error types

use thiserror::Error;

/// Enricher-specific errors
#[derive(Debug, Error)]
pub enum EnricherError {
    /// Configuration asked for a tag outside the permitted set
    #[error("un-permitted metadata tag specified in configuration: {tag}")]
    UnpermittedTag { tag: String },

    /// Stop called on an enricher that was never started
    #[error("trying to stop an enricher that was never started")]
    StopBeforeStart,

    /// Record submitted before start
    #[error("enricher is not started")]
    NotStarted,

    /// Start called twice without an intervening stop
    #[error("enricher is already started")]
    AlreadyStarted,

    /// Dispatch error
    #[error("dispatch error: {0}")]
    Dispatch(#[from] dispatcher::DispatcherError),
}

impl EnricherError {
    /// Create an un-permitted tag error
    pub fn unpermitted_tag(tag: impl Into<String>) -> Self {
        Self::UnpermittedTag { tag: tag.into() }
    }
}
