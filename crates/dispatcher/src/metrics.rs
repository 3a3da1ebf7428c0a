//! Dispatch metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Metrics for a single dispatcher
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Total items admitted through enqueue
    enqueued: AtomicU64,
    /// Total enrichment calls finished, success or failure
    completed: AtomicU64,
    /// Total enrichment calls that returned an error
    failed: AtomicU64,
    /// Total sequence slots released downstream
    released: AtomicU64,
    /// Total output items handed to the emitter
    emitted: AtomicU64,
    /// Current worker queue length
    queue_len: AtomicUsize,
    /// Current reorder buffer occupancy (always 0 in unordered mode)
    buffer_len: AtomicUsize,
    /// Highest reorder buffer occupancy observed
    buffer_peak: AtomicUsize,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get total enqueued count
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    /// Increment enqueued count
    pub fn inc_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total completed count
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Increment completed count
    pub fn inc_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total failure count
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Increment failure count
    pub fn inc_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total released count
    pub fn released(&self) -> u64 {
        self.released.load(Ordering::Relaxed)
    }

    /// Increment released count
    pub fn inc_released(&self) {
        self.released.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total emitted count
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    /// Increment emitted count
    pub fn inc_emitted(&self) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current worker queue length
    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    /// Set current worker queue length
    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    /// Get current reorder buffer occupancy
    pub fn buffer_len(&self) -> usize {
        self.buffer_len.load(Ordering::Relaxed)
    }

    /// Set current reorder buffer occupancy, tracking the peak
    pub fn set_buffer_len(&self, len: usize) {
        self.buffer_len.store(len, Ordering::Relaxed);
        self.buffer_peak.fetch_max(len, Ordering::Relaxed);
    }

    /// Get highest reorder buffer occupancy observed
    pub fn buffer_peak(&self) -> usize {
        self.buffer_peak.load(Ordering::Relaxed)
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> DispatchSnapshot {
        DispatchSnapshot {
            enqueued: self.enqueued(),
            completed: self.completed(),
            failed: self.failed(),
            released: self.released(),
            emitted: self.emitted(),
            queue_len: self.queue_len(),
            buffer_len: self.buffer_len(),
            buffer_peak: self.buffer_peak(),
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy)]
pub struct DispatchSnapshot {
    pub enqueued: u64,
    pub completed: u64,
    pub failed: u64,
    pub released: u64,
    pub emitted: u64,
    pub queue_len: usize,
    pub buffer_len: usize,
    pub buffer_peak: usize,
}
