//! GCE metadata server client
//!
//! Talks to the instance metadata endpoint available on GCE VMs. Every
//! request must carry the `Metadata-Flavor: Google` header or the server
//! rejects it.

use std::time::Duration;

use tracing::instrument;

use crate::client::MetadataClient;
use crate::error::{MetadataError, Result};

/// Metadata server root on a GCE instance
pub const DEFAULT_BASE_URL: &str = "http://metadata.google.internal/computeMetadata/v1";

const METADATA_FLAVOR_HEADER: &str = "Metadata-Flavor";
const METADATA_FLAVOR_VALUE: &str = "Google";

/// HTTP client for the GCE metadata server
#[derive(Debug, Clone)]
pub struct GceMetadataClient {
    http: reqwest::Client,
    base_url: String,
}

impl GceMetadataClient {
    /// Create a client against the real metadata server
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client against a custom endpoint (tests, emulators)
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(2))
            .build()
            .map_err(|e| MetadataError::ClientBuild {
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Endpoint this client queries
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, field: &str, endpoint: &str) -> Result<reqwest::Response> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .http
            .get(&url)
            .header(METADATA_FLAVOR_HEADER, METADATA_FLAVOR_VALUE)
            .send()
            .await
            .map_err(|e| MetadataError::http(field, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetadataError::Service {
                field: field.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }

    async fn get_text(&self, field: &str, endpoint: &str) -> Result<String> {
        let response = self.get(field, endpoint).await?;
        let body = response
            .text()
            .await
            .map_err(|e| MetadataError::http(field, e.to_string()))?;
        Ok(body.trim().to_string())
    }
}

impl MetadataClient for GceMetadataClient {
    #[instrument(name = "gce_zone", skip(self))]
    async fn zone(&self) -> Result<String> {
        self.get_text("zone", "instance/zone").await
    }

    #[instrument(name = "gce_instance_tags", skip(self))]
    async fn instance_tags(&self) -> Result<Vec<String>> {
        let response = self.get("tags", "instance/tags").await?;
        response
            .json::<Vec<String>>()
            .await
            .map_err(|e| MetadataError::malformed("tags", e.to_string()))
    }

    #[instrument(name = "gce_instance_name", skip(self))]
    async fn instance_name(&self) -> Result<String> {
        self.get_text("name", "instance/name").await
    }

    #[instrument(name = "gce_hostname", skip(self))]
    async fn hostname(&self) -> Result<String> {
        self.get_text("hostname", "instance/hostname").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_zone_lookup_sends_flavor_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/instance/zone"))
            .and(header(METADATA_FLAVOR_HEADER, METADATA_FLAVOR_VALUE))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("projects/123456789/zones/us-central1-a"),
            )
            .mount(&server)
            .await;

        let client = GceMetadataClient::with_base_url(server.uri()).unwrap();
        let zone = client.zone().await.unwrap();
        assert_eq!(zone, "projects/123456789/zones/us-central1-a");
    }

    #[tokio::test]
    async fn test_tags_parsed_from_json_array() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/instance/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"["web","prod"]"#))
            .mount(&server)
            .await;

        let client = GceMetadataClient::with_base_url(server.uri()).unwrap();
        let tags = client.instance_tags().await.unwrap();
        assert_eq!(tags, vec!["web".to_string(), "prod".to_string()]);
    }

    #[tokio::test]
    async fn test_non_success_status_is_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/instance/name"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = GceMetadataClient::with_base_url(server.uri()).unwrap();
        let err = client.instance_name().await.unwrap_err();
        assert!(matches!(
            err,
            MetadataError::Service { status: 404, .. }
        ));
    }

    #[tokio::test]
    async fn test_malformed_tags_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/instance/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = GceMetadataClient::with_base_url(server.uri()).unwrap();
        let err = client.instance_tags().await.unwrap_err();
        assert!(matches!(err, MetadataError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_text_values_are_trimmed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/instance/hostname"))
            .respond_with(ResponseTemplate::new(200).set_body_string("host-1.internal\n"))
            .mount(&server)
            .await;

        let client = GceMetadataClient::with_base_url(server.uri()).unwrap();
        assert_eq!(client.hostname().await.unwrap(), "host-1.internal");
    }
}
