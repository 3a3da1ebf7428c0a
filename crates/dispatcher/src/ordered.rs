//! Ordered dispatcher - release strictly in enqueue order
//!
//! Every admitted item gets a sequence number. Completions land in a
//! reorder buffer keyed by that sequence and a cursor walks the buffer
//! upward, so output order always equals admission order no matter how
//! the enrichment calls interleave. Admission is bounded by a semaphore:
//! a permit is held from enqueue until release, capping the number of
//! admitted-but-unreleased items at `max_queue_size` and turning a stuck
//! head item into backpressure instead of unbounded buffering.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use contracts::{ContractError, Emitter};

use crate::dispatch::Dispatch;
use crate::error::DispatcherError;
use crate::metrics::{DispatchMetrics, DispatchSnapshot};

/// One admitted item on its way to a worker
struct Job<T> {
    seq: u64,
    item: T,
    slot: OwnedSemaphorePermit,
}

/// A completed entry parked until the release cursor reaches it
struct Completed<T> {
    outputs: Vec<T>,
    /// Held until release so backpressure counts buffered entries
    _slot: OwnedSemaphorePermit,
}

/// Completed-but-unreleased entries keyed by sequence number
///
/// `next_release` is the cursor: every sequence below it has gone
/// downstream exactly once, in order. An entry whose sequence matches
/// the cursor is ready; anything above it waits for the gap to fill.
struct ReorderBuffer<V> {
    entries: BTreeMap<u64, V>,
    next_release: u64,
}

impl<V> ReorderBuffer<V> {
    fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_release: 0,
        }
    }

    fn insert(&mut self, seq: u64, entry: V) {
        self.entries.insert(seq, entry);
    }

    /// Remove the entry at the cursor if it has arrived, advancing the cursor
    fn pop_ready(&mut self) -> Option<V> {
        let entry = self.entries.remove(&self.next_release)?;
        self.next_release += 1;
        Some(entry)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Sequence allocation and reorder state, guarded by one mutex
///
/// Allocating under the same lock that orders releases keeps sequence
/// numbers in strict enqueue order.
struct OrderedState<T> {
    buffer: ReorderBuffer<Completed<T>>,
    next_seq: u64,
}

impl<T> OrderedState<T> {
    fn new() -> Self {
        Self {
            buffer: ReorderBuffer::new(),
            next_seq: 0,
        }
    }

    fn alloc_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

/// Dispatcher that releases outputs in exactly the order items were enqueued
pub struct OrderedDispatcher<T> {
    work_tx: async_channel::Sender<Job<T>>,
    slots: Arc<Semaphore>,
    state: Arc<Mutex<OrderedState<T>>>,
    emitter: Arc<dyn Emitter<T>>,
    metrics: Arc<DispatchMetrics>,
    workers: Vec<JoinHandle<()>>,
}

impl<T: Send + 'static> OrderedDispatcher<T> {
    /// Spawn `worker_count` workers releasing through a reorder buffer
    /// bounded at `max_queue_size` admitted-but-unreleased items
    pub fn new<F, Fut, E>(
        emitter: E,
        enrich: F,
        max_queue_size: usize,
        worker_count: usize,
    ) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<T>, ContractError>> + Send,
        E: Emitter<T> + 'static,
    {
        let worker_count = worker_count.max(1);
        let max_queue_size = max_queue_size.max(1);

        let (work_tx, work_rx) = async_channel::bounded(worker_count);
        let slots = Arc::new(Semaphore::new(max_queue_size));
        let state = Arc::new(Mutex::new(OrderedState::new()));
        let emitter: Arc<dyn Emitter<T>> = Arc::new(emitter);
        let enrich = Arc::new(enrich);
        let metrics = Arc::new(DispatchMetrics::new());

        let workers = (0..worker_count)
            .map(|worker_id| {
                let work_rx = work_rx.clone();
                let state = Arc::clone(&state);
                let emitter = Arc::clone(&emitter);
                let enrich = Arc::clone(&enrich);
                let metrics = Arc::clone(&metrics);
                tokio::spawn(async move {
                    run_worker(worker_id, work_rx, state, emitter, enrich, metrics).await;
                })
            })
            .collect();

        Self {
            work_tx,
            slots,
            state,
            emitter,
            metrics,
            workers,
        }
    }

    /// Get the shared metrics handle
    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    /// Submit one item
    ///
    /// Suspends while `max_queue_size` items are admitted but unreleased.
    /// The sequence number is assigned only after admission, so a
    /// cancelled enqueue leaves no hole behind.
    pub async fn enqueue(&self, item: T) -> Result<(), DispatcherError> {
        let slot = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|_| DispatcherError::Stopped)?;

        let seq = {
            let mut state = self.state.lock().unwrap();
            state.alloc_seq()
        };

        if let Err(send_err) = self.work_tx.send(Job { seq, item, slot }).await {
            // A stop raced us after the sequence was handed out. Retire it
            // empty so the release cursor can pass; the caller learns the
            // item was not accepted.
            let Job { seq, slot, .. } = send_err.into_inner();
            complete(&self.state, self.emitter.as_ref(), &self.metrics, seq, Vec::new(), slot);
            return Err(DispatcherError::Stopped);
        }

        self.metrics.inc_enqueued();
        Ok(())
    }

    /// Close intake, wait for every admitted item to complete and release
    pub async fn shutdown(self) {
        self.work_tx.close();
        self.slots.close();

        for worker in self.workers {
            if let Err(e) = worker.await {
                error!(error = ?e, "Dispatch worker panicked");
            }
        }

        debug!(
            released = self.metrics.released(),
            buffer_peak = self.metrics.buffer_peak(),
            "Ordered dispatcher drained"
        );
    }
}

async fn run_worker<T, F, Fut>(
    worker_id: usize,
    work_rx: async_channel::Receiver<Job<T>>,
    state: Arc<Mutex<OrderedState<T>>>,
    emitter: Arc<dyn Emitter<T>>,
    enrich: Arc<F>,
    metrics: Arc<DispatchMetrics>,
) where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<T>, ContractError>> + Send,
{
    debug!(worker_id, "Dispatch worker started");

    while let Ok(job) = work_rx.recv().await {
        metrics.set_queue_len(work_rx.len());
        let Job { seq, item, slot } = job;

        let outputs = match (*enrich)(item).await {
            Ok(outputs) => outputs,
            Err(e) => {
                metrics.inc_failed();
                warn!(worker_id, seq, error = %e, "Enrichment failed, sequence released empty");
                Vec::new()
            }
        };

        metrics.inc_completed();
        complete(&state, emitter.as_ref(), &metrics, seq, outputs, slot);
    }

    debug!(worker_id, "Dispatch worker stopped");
}

/// Park a completed sequence and release everything contiguous from the cursor
///
/// Insert and drain happen under one lock acquisition, so the entry at the
/// cursor is never held beyond the completion that made it ready.
fn complete<T>(
    state: &Mutex<OrderedState<T>>,
    emitter: &dyn Emitter<T>,
    metrics: &DispatchMetrics,
    seq: u64,
    outputs: Vec<T>,
    slot: OwnedSemaphorePermit,
) {
    let mut state = state.lock().unwrap();
    state.buffer.insert(seq, Completed { outputs, _slot: slot });
    metrics.set_buffer_len(state.buffer.len());

    while let Some(entry) = state.buffer.pop_ready() {
        metrics.inc_released();
        for output in entry.outputs {
            emitter.emit(output);
            metrics.inc_emitted();
        }
        // Dropping the entry returns its admission slot.
    }

    metrics.set_buffer_len(state.buffer.len());
}

#[async_trait]
impl<T: Send + 'static> Dispatch<T> for OrderedDispatcher<T> {
    async fn enqueue(&self, item: T) -> Result<(), DispatcherError> {
        OrderedDispatcher::enqueue(self, item).await
    }

    async fn stop(self: Box<Self>) {
        (*self).shutdown().await;
    }

    fn snapshot(&self) -> DispatchSnapshot {
        self.metrics.snapshot()
    }
}
