//! Metadata client abstraction
//!
//! Defines the lookup trait the enricher calls into, supporting the real GCE
//! implementation and mock testing.

use std::future::Future;

use crate::error::Result;

/// Instance metadata lookup trait
///
/// Abstracts the metadata server so the enricher never hardwires a concrete
/// HTTP client. One method per resolvable field; each call is independent and
/// carries no internal timeout (the caller bounds it).
pub trait MetadataClient: Send + Sync + 'static {
    /// Fully qualified availability zone, e.g. "projects/123/zones/us-central1-a"
    fn zone(&self) -> impl Future<Output = Result<String>> + Send;

    /// Free-form instance labels, unjoined
    fn instance_tags(&self) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Instance display name
    fn instance_name(&self) -> impl Future<Output = Result<String>> + Send;

    /// Resolvable hostname
    fn hostname(&self) -> impl Future<Output = Result<String>> + Send;
}
