//! Metadata tag lookup
//!
//! Maps a permitted tag name to the metadata endpoint that backs it and
//! normalizes the response into a tag value.

use std::future::Future;
use std::time::Duration;

use metadata_client::{MetadataClient, MetadataError};
use tokio::time::timeout;

/// Look up the value for one tag name
///
/// Unknown names resolve to `Ok(None)`. The allow list was already
/// checked against the permitted set at configuration time, so anything
/// unrecognized here is skipped silently instead of failing the record.
pub(crate) async fn lookup_tag<C: MetadataClient>(
    client: &C,
    field: &str,
    lookup_timeout: Duration,
) -> Result<Option<String>, MetadataError> {
    let value = match field {
        "zone" => {
            let raw = bounded(field, lookup_timeout, client.zone()).await?;
            Some(short_zone(&raw).to_string())
        }
        "tags" => {
            let tags = bounded(field, lookup_timeout, client.instance_tags()).await?;
            Some(tags.join(","))
        }
        "name" => Some(bounded(field, lookup_timeout, client.instance_name()).await?),
        "hostname" => Some(bounded(field, lookup_timeout, client.hostname()).await?),
        _ => None,
    };

    Ok(value)
}

/// Apply the lookup timeout to one metadata call
async fn bounded<T>(
    field: &str,
    lookup_timeout: Duration,
    call: impl Future<Output = Result<T, MetadataError>>,
) -> Result<T, MetadataError> {
    match timeout(lookup_timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(MetadataError::timeout(field, lookup_timeout)),
    }
}

/// Shorten a fully qualified zone path to its final segment
///
/// The metadata service reports `projects/<number>/zones/<zone>`;
/// consumers want just `<zone>`. Unexpected shapes pass through as-is.
fn short_zone(raw: &str) -> &str {
    raw.split('/').nth(3).unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use metadata_client::{MockMetadataClient, MockMetadataConfig};

    #[test]
    fn test_short_zone_strips_project_prefix() {
        assert_eq!(
            short_zone("projects/123456789/zones/us-central1-a"),
            "us-central1-a"
        );
        assert_eq!(short_zone("us-central1-a"), "us-central1-a");
        assert_eq!(short_zone("zones/us-central1-a"), "zones/us-central1-a");
    }

    #[tokio::test]
    async fn test_lookup_resolves_every_permitted_field() {
        let client = MockMetadataClient::new();
        let timeout = Duration::from_secs(1);

        let zone = lookup_tag(&client, "zone", timeout).await.unwrap();
        assert_eq!(zone.as_deref(), Some("us-central1-a"));

        let tags = lookup_tag(&client, "tags", timeout).await.unwrap();
        assert_eq!(tags.as_deref(), Some("telemetry,mock"));

        let name = lookup_tag(&client, "name", timeout).await.unwrap();
        assert_eq!(name.as_deref(), Some("mock-instance"));

        let hostname = lookup_tag(&client, "hostname", timeout).await.unwrap();
        assert_eq!(
            hostname.as_deref(),
            Some("mock-instance.c.mock-project.internal")
        );
    }

    #[tokio::test]
    async fn test_lookup_skips_unknown_field() {
        let client = MockMetadataClient::new();
        let value = lookup_tag(&client, "region", Duration::from_secs(1))
            .await
            .unwrap();
        assert!(value.is_none());
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_lookup_times_out() {
        let config = MockMetadataConfig {
            delay: Some(Duration::from_millis(100)),
            ..Default::default()
        };
        let client = MockMetadataClient::with_config(config);

        let err = lookup_tag(&client, "zone", Duration::from_millis(5))
            .await
            .unwrap_err();
        assert!(matches!(err, MetadataError::Timeout { .. }));
        assert!(err.to_string().contains("zone"));
    }
}
