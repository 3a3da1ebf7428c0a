//! Complete Pipeline Demo
//!
//! Demonstrates reading a single configuration file, enriching a stream
//! of generated records with mock metadata, and fanning the results out
//! to the configured sinks in arrival order.
//!
//! Run with: cargo run --bin complete_pipeline [config_path]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use config_loader::ConfigLoader;
use contracts::{Record, SourceKind};
use enricher::MetadataEnricher;
use metadata_client::{MockMetadataClient, MockMetadataConfig};
use router::RecordRouter;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Complete Pipeline Demo");

    let config_path = resolve_config_path();
    info!(path = %config_path.display(), "Loading unified config file");
    let blueprint = ConfigLoader::load_from_path(config_path.as_path())?;
    info!(
        ordered = blueprint.enrich.ordered,
        allow_tags = ?blueprint.enrich.allow_tags,
        sinks = blueprint.sinks.len(),
        "Blueprint loaded"
    );

    // ==== Stage 1: Create Mock Metadata Client ====
    let client = MockMetadataClient::with_config(MockMetadataConfig {
        delay: Some(Duration::from_millis(2)),
        ..MockMetadataConfig::default()
    });

    // ==== Stage 2: Build Router from configured sinks ====
    let router = Arc::new(RecordRouter::from_configs(&blueprint.sinks).await?);

    // ==== Stage 3: Start Enricher ====
    let mut enricher = MetadataEnricher::new(client, &blueprint.enrich)?;
    enricher.start(Arc::clone(&router))?;

    // ==== Stage 4: Generate records per the source section ====
    let (count, interval) = synthetic_settings(&blueprint.source.kind, &blueprint);
    info!(count, interval_ms = interval.as_millis() as u64, "Running pipeline");

    for i in 0..count {
        let record = Record::new(format!("demo-{i:03}"))
            .with_tag("host", "demo-host")
            .with_field("seq", i)
            .with_field("load", (i % 10) as f64 / 10.0);

        enricher.enqueue(record).await?;

        if !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
    }

    // ==== Stage 5: Graceful Shutdown ====
    info!("Shutting down...");

    let snapshot = enricher.stop().await?;
    info!(
        enqueued = snapshot.enqueued,
        released = snapshot.released,
        emitted = snapshot.emitted,
        buffer_peak = snapshot.buffer_peak,
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
        Err(_) => info!("Router still referenced, skipping sink drain"),
    }

    info!("Complete Pipeline Demo finished");
    Ok(())
}

fn resolve_config_path() -> PathBuf {
    std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("demos/config/full.toml"))
}

/// Record count and pacing, taken from the source section when synthetic
fn synthetic_settings(
    kind: &SourceKind,
    blueprint: &contracts::PipelineBlueprint,
) -> (u64, Duration) {
    match kind {
        SourceKind::Synthetic => (
            blueprint.source.count,
            Duration::from_millis(blueprint.source.interval_ms),
        ),
        _ => (40, Duration::from_millis(5)),
    }
}
