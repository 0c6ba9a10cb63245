//! Dispatcher counters for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Counters for a single dispatcher
#[derive(Debug, Default)]
pub struct DispatcherMetrics {
    /// Current queue length (approximate)
    queue_len: AtomicUsize,
    /// Jobs accepted into the queue
    submitted_count: AtomicU64,
    /// Jobs applied successfully by workers or the drain
    applied_count: AtomicU64,
    /// Jobs whose sink write failed
    failure_count: AtomicU64,
    /// Jobs applied inline by the shutdown drain
    drained_count: AtomicU64,
}

impl DispatcherMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn submitted_count(&self) -> u64 {
        self.submitted_count.load(Ordering::Relaxed)
    }

    pub fn inc_submitted_count(&self) {
        self.submitted_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn applied_count(&self) -> u64 {
        self.applied_count.load(Ordering::Relaxed)
    }

    pub fn inc_applied_count(&self) {
        self.applied_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn drained_count(&self) -> u64 {
        self.drained_count.load(Ordering::Relaxed)
    }

    pub fn add_drained_count(&self, count: u64) {
        self.drained_count.fetch_add(count, Ordering::Relaxed);
    }

    /// Get a snapshot of all counters
    pub fn snapshot(&self) -> DispatcherMetricsSnapshot {
        DispatcherMetricsSnapshot {
            queue_len: self.queue_len(),
            submitted_count: self.submitted_count(),
            applied_count: self.applied_count(),
            failure_count: self.failure_count(),
            drained_count: self.drained_count(),
        }
    }
}

/// Snapshot of dispatcher counters (for reporting)
#[derive(Debug, Clone, Copy)]
pub struct DispatcherMetricsSnapshot {
    pub queue_len: usize,
    pub submitted_count: u64,
    pub applied_count: u64,
    pub failure_count: u64,
    pub drained_count: u64,
}
