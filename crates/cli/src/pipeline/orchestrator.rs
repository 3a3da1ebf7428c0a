//! Pipeline orchestrator - coordinates all components.
//!
//! Wires the record source, enricher, and router together, then drains
//! them in reverse order on shutdown so nothing admitted is lost.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::PipelineBlueprint;
use enricher::MetadataEnricher;
use metadata_client::{GceMetadataClient, MetadataClient, MockMetadataClient};
use observability::{record_dispatch_depth, record_enqueue_wait_ms, record_record_ingested};
use router::RecordRouter;
use tracing::{info, warn};

use super::source::{source_label, spawn_source};
use super::PipelineStats;
use crate::error::CliError;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The pipeline blueprint configuration
    pub blueprint: PipelineBlueprint,

    /// Maximum number of records to ingest (None = unlimited)
    pub max_records: Option<u64>,

    /// Pipeline timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Channel buffer size between source and enricher
    pub buffer_size: usize,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,

    /// Use the built-in mock metadata client
    pub mock_metadata: bool,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion
    pub async fn run(self) -> Result<PipelineStats> {
        if self.config.mock_metadata {
            info!("Running with MOCK metadata client (no metadata server required)");
            let client = MockMetadataClient::new();
            self.run_with_client(client).await
        } else {
            let client = GceMetadataClient::new()
                .map_err(|e| CliError::metadata_server(e.to_string()))?;
            self.run_with_client(client).await
        }
    }

    /// Pipeline logic shared between mock and real metadata clients
    async fn run_with_client<C: MetadataClient>(self, client: C) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Setup Router
        info!("Setting up record router...");
        if blueprint.sinks.is_empty() {
            warn!("No sinks configured - enriched records will be discarded");
        }
        let router = Arc::new(
            RecordRouter::from_configs(&blueprint.sinks)
                .await
                .context("Failed to create record router")?,
        );
        let active_sinks = blueprint.sinks.len();

        // Setup Enricher
        info!("Configuring enricher...");
        let mut enricher = MetadataEnricher::new(client, &blueprint.enrich)
            .context("Failed to configure enricher")?;
        enricher
            .start(Arc::clone(&router))
            .context("Failed to start enricher")?;

        // Start Source
        let mut source = spawn_source(&blueprint.source, self.config.buffer_size)
            .await
            .context("Failed to start record source")?;
        let label = source_label(blueprint.source.kind);

        let max_records = self.config.max_records;
        info!(
            max_records = ?max_records,
            ordered = blueprint.enrich.ordered,
            active_sinks,
            "Pipeline running"
        );

        let mut stats = PipelineStats {
            active_sinks,
            ..Default::default()
        };

        // Ingest phase
        let ingest = async {
            while let Some(record) = source.recv().await {
                stats.records_ingested += 1;
                record_record_ingested(label);

                let wait_start = Instant::now();
                if let Err(e) = enricher.enqueue(record).await {
                    warn!(error = %e, "Enricher rejected record, stopping ingest");
                    break;
                }
                let wait_ms = wait_start.elapsed().as_secs_f64() * 1000.0;
                stats.enqueue_wait.push(wait_ms);
                record_enqueue_wait_ms(wait_ms);

                if let Some(snapshot) = enricher.snapshot() {
                    record_dispatch_depth(snapshot.queue_len, snapshot.buffer_len);
                }

                if let Some(max) = max_records {
                    if stats.records_ingested >= max {
                        info!(records = stats.records_ingested, "Reached max records limit");
                        break;
                    }
                }
            }
        };

        // Run with optional timeout
        if let Some(timeout) = self.config.timeout {
            if tokio::time::timeout(timeout, ingest).await.is_err() {
                warn!(
                    timeout_secs = timeout.as_secs(),
                    "Pipeline timed out, draining"
                );
            }
        } else {
            ingest.await;
        }

        // Shutdown: source first, then drain the enricher, then the sinks
        info!("Shutting down pipeline...");
        stats.records_malformed = source.malformed();
        source.shutdown().await;

        let snapshot = enricher.stop().await.context("Failed to drain enricher")?;
        stats.records_released = snapshot.released;
        stats.records_emitted = snapshot.emitted;
        stats.enrich_failures = snapshot.failed;
        stats.buffer_peak = snapshot.buffer_peak;

        // The enricher stop dropped its router clone, so ownership is back here
        stats.sinks = match Arc::try_unwrap(router) {
            Ok(router) => router.shutdown().await,
            Err(router) => {
                warn!("Router still shared after enricher stop, reporting live metrics");
                router.metrics()
            }
        };

        stats.duration = start_time.elapsed();

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            rps = format!("{:.2}", stats.records_per_sec()),
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}
