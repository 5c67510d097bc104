//! Dispatcher counters.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct DispatcherMetrics {
    /// Idle signals published.
    pub idle_published: AtomicU64,
    /// Idle signals skipped because one was already outstanding.
    pub idle_suppressed: AtomicU64,
    /// Work-assigned events received.
    pub assignments_received: AtomicU64,
    /// Units of work handed to agents.
    pub work_delivered: AtomicU64,
}

impl DispatcherMetrics {
    pub fn record_idle_published(&self) {
        self.idle_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_idle_suppressed(&self) {
        self.idle_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_assignment(&self) {
        self.assignments_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivery(&self) {
        self.work_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DispatcherSnapshot {
        DispatcherSnapshot {
            idle_published: self.idle_published.load(Ordering::Relaxed),
            idle_suppressed: self.idle_suppressed.load(Ordering::Relaxed),
            assignments_received: self.assignments_received.load(Ordering::Relaxed),
            work_delivered: self.work_delivered.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatcherSnapshot {
    pub idle_published: u64,
    pub idle_suppressed: u64,
    pub assignments_received: u64,
    pub work_delivered: u64,
}
