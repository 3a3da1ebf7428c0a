//! RecordRouter - fans enriched records out to every configured sink

use std::sync::Arc;

use tracing::{info, instrument, warn};

use contracts::{Emitter, Record, SinkConfig, SinkType};

use crate::error::RouterError;
use crate::handle::SinkHandle;
use crate::metrics::SinkSnapshot;
use crate::sinks::{FileSink, LogSink, NetworkSink};

/// Fans records out to a set of independent sink workers
///
/// Implements [`Emitter`], so it sits directly downstream of the
/// enrichment dispatcher. Each sink gets its own queue and worker task;
/// a slow or failing sink drops records instead of backing up the line.
#[derive(Debug)]
pub struct RecordRouter {
    handles: Vec<SinkHandle>,
}

impl RecordRouter {
    /// Build a router from sink configurations
    #[instrument(
        name = "router_from_configs",
        skip(configs),
        fields(sink_count = configs.len())
    )]
    pub async fn from_configs(configs: &[SinkConfig]) -> Result<Self, RouterError> {
        let mut handles = Vec::with_capacity(configs.len());
        for config in configs {
            handles.push(create_sink_handle(config).await?);
        }

        if handles.is_empty() {
            warn!("No sinks configured - enriched records will be discarded");
        }

        info!(sinks = handles.len(), "Record router ready");
        Ok(Self { handles })
    }

    /// Create a router with custom sink handles (for testing)
    pub fn with_handles(handles: Vec<SinkHandle>) -> Self {
        Self { handles }
    }

    /// Get metrics for all sinks
    pub fn metrics(&self) -> Vec<(String, SinkSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Shut down every sink worker, draining their queues
    ///
    /// Returns the final per-sink metrics after the drain.
    pub async fn shutdown(self) -> Vec<(String, SinkSnapshot)> {
        let mut finals = Vec::with_capacity(self.handles.len());
        for handle in self.handles {
            let name = handle.name().to_string();
            let metrics = Arc::clone(handle.metrics());
            handle.shutdown().await;
            finals.push((name, metrics.snapshot()));
        }
        info!("Record router shutdown complete");
        finals
    }
}

impl Emitter<Record> for RecordRouter {
    fn emit(&self, record: Record) {
        for handle in &self.handles {
            handle.try_send(record.clone());
        }
    }
}

/// Create a SinkHandle from configuration
#[instrument(
    name = "router_create_sink_handle",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
async fn create_sink_handle(config: &SinkConfig) -> Result<SinkHandle, RouterError> {
    match config.sink_type {
        SinkType::Log => {
            let sink = LogSink::new(&config.name);
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params)
                .map_err(|e| RouterError::sink_creation(&config.name, e.to_string()))?;
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
        SinkType::Network => {
            let sink = NetworkSink::from_params(&config.name, &config.params)
                .await
                .map_err(|e| RouterError::sink_creation(&config.name, e.to_string()))?;
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
    }
}
