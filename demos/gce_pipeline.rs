//! GCE Pipeline Demo
//!
//! Runs the enrichment pipeline against the real metadata server, so it
//! only produces tags when executed on a GCE instance (or anywhere
//! `metadata.google.internal` resolves).
//!
//! Run with: cargo run --bin gce_pipeline [config_path]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use config_loader::ConfigLoader;
use contracts::Record;
use enricher::MetadataEnricher;
use metadata_client::{GceMetadataClient, MetadataClient};
use router::RecordRouter;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize observability (Tracing + Prometheus)
    observability::init()?;

    info!("Starting GCE Pipeline Demo");

    // ==== Stage 1: Configure Blueprint ====
    let config_path = resolve_config_path();
    info!(path = %config_path.display(), "Loading blueprint config");
    let blueprint = ConfigLoader::load_from_path(config_path.as_path())?;

    // ==== Stage 2: Probe the Metadata Server ====
    let client = GceMetadataClient::new()?;
    info!(endpoint = client.base_url(), "Probing metadata server...");

    match client.instance_name().await {
        Ok(name) => info!(instance = %name, "Metadata server reachable"),
        Err(e) => warn!(error = %e, "Probe failed; lookups will fail and records pass through untagged"),
    }

    // ==== Stage 3: Build Router from configured sinks ====
    info!("Setting up record router...");
    if blueprint.sinks.is_empty() {
        warn!("No sinks configured; enriched records will be dropped");
    }
    let router = Arc::new(RecordRouter::from_configs(&blueprint.sinks).await?);

    // ==== Stage 4: Start Enricher ====
    info!("Configuring enricher...");
    let mut enricher = MetadataEnricher::new(client, &blueprint.enrich)?;
    enricher.start(Arc::clone(&router))?;

    // ==== Stage 5: Drive Records ====
    let target_records = 100u64;
    info!("Running pipeline, target: {} records", target_records);

    for i in 0..target_records {
        let record = Record::new(format!("gce-demo-{i:03}"))
            .with_field("seq", i)
            .with_field("load", (i % 10) as f64 / 10.0);

        enricher.enqueue(record).await?;
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // ==== Stage 6: Cleanup ====
    info!("Shutting down and cleaning up...");

    let snapshot = enricher.stop().await?;
    info!(
        enqueued = snapshot.enqueued,
        released = snapshot.released,
        failed = snapshot.failed,
        "Enricher drained"
    );

    match Arc::try_unwrap(router) {
        Ok(router) => {
            for (name, sink) in router.shutdown().await {
                info!(
                    sink = %name,
                    written = sink.written,
                    failed = sink.failed,
                    dropped = sink.dropped,
                    "Sink finished"
                );
            }
        }
        Err(_) => warn!("Router still referenced, skipping sink drain"),
    }

    info!("GCE Pipeline Demo finished");
    Ok(())
}

fn resolve_config_path() -> PathBuf {
    std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("demos/config/full.toml"))
}
