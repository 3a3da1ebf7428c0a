//! # Metadata Client
//!
//! Instance metadata lookup module.
//!
//! Responsibilities:
//! - Define the `MetadataClient` abstraction the enricher calls into
//! - Talk to the GCE metadata server over HTTP
//! - Provide a deterministic mock with failure and latency injection

pub mod client;
pub mod error;
pub mod gce_client;
pub mod mock_client;

pub use client::MetadataClient;
pub use error::{MetadataError, Result};
pub use gce_client::{GceMetadataClient, DEFAULT_BASE_URL};
pub use mock_client::{MockMetadataClient, MockMetadataConfig};
