//! Mock metadata client
//!
//! Deterministic implementation for unit tests, supporting failure injection
//! and artificial lookup latency.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::instrument;

use crate::client::MetadataClient;
use crate::error::{MetadataError, Result};

/// Mock client configuration
#[derive(Debug, Clone)]
pub struct MockMetadataConfig {
    /// Zone value, served fully qualified like the real endpoint
    pub zone: String,
    /// Instance name value
    pub name: String,
    /// Hostname value
    pub hostname: String,
    /// Instance label values
    pub tags: Vec<String>,
    /// Fields whose lookup should fail
    pub fail_fields: Vec<String>,
    /// Artificial latency applied to every lookup
    pub delay: Option<Duration>,
}

impl Default for MockMetadataConfig {
    fn default() -> Self {
        Self {
            zone: "projects/123456789/zones/us-central1-a".into(),
            name: "mock-instance".into(),
            hostname: "mock-instance.c.mock-project.internal".into(),
            tags: vec!["telemetry".into(), "mock".into()],
            fail_fields: Vec::new(),
            delay: None,
        }
    }
}

/// Mock metadata client
pub struct MockMetadataClient {
    /// Configuration (failure scenarios injectable)
    config: MockMetadataConfig,
    /// Lookup counter across all fields
    call_count: AtomicU64,
}

impl MockMetadataClient {
    /// Create a mock with default values
    pub fn new() -> Self {
        Self::with_config(MockMetadataConfig::default())
    }

    /// Create a mock with the given configuration
    pub fn with_config(config: MockMetadataConfig) -> Self {
        Self {
            config,
            call_count: AtomicU64::new(0),
        }
    }

    /// Number of lookups served so far
    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::SeqCst)
    }

    async fn simulate(&self, field: &str) -> Result<()> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.config.delay {
            tokio::time::sleep(delay).await;
        }

        if self.config.fail_fields.iter().any(|f| f == field) {
            return Err(MetadataError::http(field, "mock failure"));
        }

        Ok(())
    }
}

impl Default for MockMetadataClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataClient for MockMetadataClient {
    #[instrument(name = "mock_metadata_zone", skip(self))]
    async fn zone(&self) -> Result<String> {
        self.simulate("zone").await?;
        Ok(self.config.zone.clone())
    }

    #[instrument(name = "mock_metadata_tags", skip(self))]
    async fn instance_tags(&self) -> Result<Vec<String>> {
        self.simulate("tags").await?;
        Ok(self.config.tags.clone())
    }

    #[instrument(name = "mock_metadata_name", skip(self))]
    async fn instance_name(&self) -> Result<String> {
        self.simulate("name").await?;
        Ok(self.config.name.clone())
    }

    #[instrument(name = "mock_metadata_hostname", skip(self))]
    async fn hostname(&self) -> Result<String> {
        self.simulate("hostname").await?;
        Ok(self.config.hostname.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_mock_serves_configured_values() {
        let client = MockMetadataClient::new();
        assert_eq!(
            client.zone().await.unwrap(),
            "projects/123456789/zones/us-central1-a"
        );
        assert_eq!(client.instance_name().await.unwrap(), "mock-instance");
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_failure_injection() {
        let client = MockMetadataClient::with_config(MockMetadataConfig {
            fail_fields: vec!["zone".into()],
            ..MockMetadataConfig::default()
        });

        assert!(client.zone().await.is_err());
        // Other fields unaffected
        assert!(client.hostname().await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_delay_applies() {
        let client = MockMetadataClient::with_config(MockMetadataConfig {
            delay: Some(Duration::from_millis(20)),
            ..MockMetadataConfig::default()
        });

        let start = Instant::now();
        client.instance_tags().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
