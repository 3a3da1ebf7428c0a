//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Work submitted to a dispatcher that has been stopped
    #[error("dispatcher is stopped and no longer accepts work")]
    Stopped,
}
