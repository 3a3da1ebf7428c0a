//! Unordered dispatcher - release on completion
//!
//! Outputs go downstream the instant their enrichment call finishes, so
//! a slow item never holds up a fast one. Memory stays bounded by the
//! worker count: the work channel holds at most one item per idle worker
//! and nothing is parked after completion.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use contracts::{ContractError, Emitter};

use crate::dispatch::Dispatch;
use crate::error::DispatcherError;
use crate::metrics::{DispatchMetrics, DispatchSnapshot};

/// Dispatcher that releases each item as soon as it completes
pub struct UnorderedDispatcher<T> {
    work_tx: async_channel::Sender<T>,
    workers: Vec<JoinHandle<()>>,
    metrics: Arc<DispatchMetrics>,
}

impl<T: Send + 'static> UnorderedDispatcher<T> {
    /// Spawn `worker_count` workers feeding `emitter` through `enrich`
    pub fn new<F, Fut, E>(emitter: E, enrich: F, worker_count: usize) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<T>, ContractError>> + Send,
        E: Emitter<T> + 'static,
    {
        let worker_count = worker_count.max(1);
        let (work_tx, work_rx) = async_channel::bounded(worker_count);
        let emitter = Arc::new(emitter);
        let enrich = Arc::new(enrich);
        let metrics = Arc::new(DispatchMetrics::new());

        let workers = (0..worker_count)
            .map(|worker_id| {
                let work_rx = work_rx.clone();
                let emitter = Arc::clone(&emitter);
                let enrich = Arc::clone(&enrich);
                let metrics = Arc::clone(&metrics);
                tokio::spawn(async move {
                    run_worker(worker_id, work_rx, emitter, enrich, metrics).await;
                })
            })
            .collect();

        Self {
            work_tx,
            workers,
            metrics,
        }
    }

    /// Get the shared metrics handle
    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    /// Submit one item; suspends while all worker slots are busy
    pub async fn enqueue(&self, item: T) -> Result<(), DispatcherError> {
        self.work_tx
            .send(item)
            .await
            .map_err(|_| DispatcherError::Stopped)?;
        self.metrics.inc_enqueued();
        Ok(())
    }

    /// Close intake and wait for the workers to drain the queue
    pub async fn shutdown(self) {
        self.work_tx.close();

        for worker in self.workers {
            if let Err(e) = worker.await {
                error!(error = ?e, "Dispatch worker panicked");
            }
        }

        debug!(
            released = self.metrics.released(),
            "Unordered dispatcher drained"
        );
    }
}

async fn run_worker<T, F, Fut, E>(
    worker_id: usize,
    work_rx: async_channel::Receiver<T>,
    emitter: Arc<E>,
    enrich: Arc<F>,
    metrics: Arc<DispatchMetrics>,
) where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<T>, ContractError>> + Send,
    E: Emitter<T> + ?Sized,
{
    debug!(worker_id, "Dispatch worker started");

    while let Ok(item) = work_rx.recv().await {
        metrics.set_queue_len(work_rx.len());

        match (*enrich)(item).await {
            Ok(outputs) => {
                metrics.inc_completed();
                metrics.inc_released();
                for output in outputs {
                    emitter.emit(output);
                    metrics.inc_emitted();
                }
            }
            Err(e) => {
                metrics.inc_completed();
                metrics.inc_failed();
                metrics.inc_released();
                warn!(worker_id, error = %e, "Enrichment failed, item released empty");
            }
        }
    }

    debug!(worker_id, "Dispatch worker stopped");
}

#[async_trait]
impl<T: Send + 'static> Dispatch<T> for UnorderedDispatcher<T> {
    async fn enqueue(&self, item: T) -> Result<(), DispatcherError> {
        UnorderedDispatcher::enqueue(self, item).await
    }

    async fn stop(self: Box<Self>) {
        (*self).shutdown().await;
    }

    fn snapshot(&self) -> DispatchSnapshot {
        self.metrics.snapshot()
    }
}
