//! # Enricher
//!
//! Record enrichment with instance metadata.
//!
//! Responsibilities:
//! - Validate the configured tag allow list against the permitted set
//! - Resolve each allowed tag through the metadata client, bounded by
//!   the lookup timeout
//! - Drive records through the concurrent dispatcher in the configured
//!   release mode and hand the results to the emitter

pub mod error;
pub mod processor;
mod tags;

pub use error::EnricherError;
pub use processor::MetadataEnricher;
