//! # Dispatcher
//!
//! Concurrent enrichment dispatch with two release modes.
//!
//! Responsibilities:
//! - Run an async enrichment function on a bounded worker pool
//! - Release outputs either on completion or strictly in enqueue order
//! - Apply backpressure instead of growing queues without bound
//!
//! The ordered mode exists for consumers that correlate records by
//! position; everyone else should prefer unordered, which never lets a
//! slow lookup hold up the line.

pub mod dispatch;
pub mod error;
pub mod metrics;
pub mod ordered;
pub mod unordered;

pub use dispatch::Dispatch;
pub use error::DispatcherError;
pub use metrics::{DispatchMetrics, DispatchSnapshot};
pub use ordered::OrderedDispatcher;
pub use unordered::UnorderedDispatcher;
