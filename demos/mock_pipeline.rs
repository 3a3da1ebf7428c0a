//! Mock Pipeline Demo
//!
//! Demonstrates the enrichment pipeline with the mock metadata client.
//! This demo runs without any external metadata server.
//!
//! Run with: cargo run --bin mock_pipeline [config_path]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use config_loader::ConfigLoader;
use contracts::{
    ConfigVersion, EnrichConfig, PipelineBlueprint, Record, SinkConfig, SinkType, SourceConfig,
};
use enricher::MetadataEnricher;
use metadata_client::{MockMetadataClient, MockMetadataConfig};
use router::RecordRouter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("Starting Mock Pipeline Demo");

    // ==== Stage 1: Use default config or load from file ====
    let blueprint = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading blueprint config");
        ConfigLoader::load_from_path(std::path::Path::new(&path))?
    } else {
        // Create a minimal test blueprint
        create_test_blueprint()
    };

    // ==== Stage 2: Create Mock Metadata Client ====
    tracing::info!("Creating mock metadata client...");
    let client = MockMetadataClient::with_config(MockMetadataConfig {
        delay: Some(Duration::from_millis(3)),
        ..MockMetadataConfig::default()
    });

    // ==== Stage 3: Build Router from configured sinks ====
    tracing::info!(sinks = blueprint.sinks.len(), "Setting up record router...");
    let router = Arc::new(RecordRouter::from_configs(&blueprint.sinks).await?);

    // ==== Stage 4: Start Enricher and feed records ====
    let mut enricher = MetadataEnricher::new(client, &blueprint.enrich)?;
    enricher.start(Arc::clone(&router))?;

    let target_records = 30u64;
    tracing::info!(
        target_records,
        ordered = blueprint.enrich.ordered,
        allow_tags = ?blueprint.enrich.allow_tags,
        "Feeding records"
    );

    for i in 0..target_records {
        let name = match i % 3 {
            0 => "cpu",
            1 => "mem",
            _ => "diskio",
        };
        let record = Record::new(name)
            .with_tag("host", "demo-host")
            .with_field("seq", i)
            .with_field("value", (i as f64) * 0.1);

        enricher.enqueue(record).await?;
    }

    // ==== Stage 5: Drain and Shutdown ====
    tracing::info!("Draining enricher...");
    let snapshot = enricher.stop().await?;
    tracing::info!(
        enqueued = snapshot.enqueued,
        released = snapshot.released,
        emitted = snapshot.emitted,
        "Enricher drained"
    );

    match Arc::try_unwrap(router) {
        Ok(router) => {
            for (name, sink) in router.shutdown().await {
                tracing::info!(
                    sink = %name,
                    written = sink.written,
                    failed = sink.failed,
                    dropped = sink.dropped,
                    "Sink finished"
                );
            }
        }
        Err(_) => tracing::warn!("Router still referenced, skipping sink drain"),
    }

    tracing::info!("Mock Pipeline Demo finished");
    Ok(())
}

fn create_test_blueprint() -> PipelineBlueprint {
    PipelineBlueprint {
        version: ConfigVersion::V1,
        source: SourceConfig::default(),
        enrich: EnrichConfig {
            allow_tags: vec!["zone".to_string(), "name".to_string()],
            timeout_ms: 1_000,
            ordered: false,
            max_parallel_calls: 4,
            max_queue_size: 32,
        },
        sinks: vec![SinkConfig {
            name: "console".to_string(),
            sink_type: SinkType::Log,
            queue_capacity: 100,
            params: HashMap::new(),
        }],
    }
}
