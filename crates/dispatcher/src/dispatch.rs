//! Dispatch trait - the contract shared by both release modes

use async_trait::async_trait;

use crate::error::DispatcherError;
use crate::metrics::DispatchSnapshot;

/// A concurrent enrichment dispatcher
///
/// Both implementations run the enrichment function on a bounded worker
/// pool and hand outputs to an `Emitter`. They differ only in release
/// policy: `OrderedDispatcher` releases strictly in enqueue order,
/// `UnorderedDispatcher` releases each item the moment it completes.
#[async_trait]
pub trait Dispatch<T: Send + 'static>: Send + Sync {
    /// Submit one item for enrichment
    ///
    /// Suspends while all worker slots are busy. In ordered mode it also
    /// suspends while `max_queue_size` items are admitted but unreleased;
    /// that backpressure is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`DispatcherError::Stopped`] if the dispatcher has been
    /// stopped.
    async fn enqueue(&self, item: T) -> Result<(), DispatcherError>;

    /// Stop accepting work, wait for everything in flight to be released
    async fn stop(self: Box<Self>);

    /// Get a snapshot of the dispatch counters
    fn snapshot(&self) -> DispatchSnapshot;
}
