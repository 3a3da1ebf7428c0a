//! # Router
//!
//! Record fan-out to sinks.
//!
//! Responsibilities:
//! - Receive enriched records from the dispatcher
//! - Fan out to every configured sink
//! - Isolate slow sinks so they never block the enrichment path

pub mod error;
pub mod handle;
pub mod metrics;
pub mod router;
pub mod sinks;

pub use error::RouterError;
pub use handle::SinkHandle;
pub use metrics::{SinkMetrics, SinkSnapshot};
pub use router::RecordRouter;
pub use sinks::{FileSink, FileSinkConfig, LogSink, NetworkSink, NetworkSinkConfig, WireFormat};
