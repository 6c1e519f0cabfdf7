//! Process metrics: atomic counters, snapshot-readable.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics handle for recording counters
#[derive(Debug, Default)]
pub struct Metrics {
    schedules_run: AtomicU64,
    dashboards_processed: AtomicU64,
    dashboards_failed: AtomicU64,
    panels_captured: AtomicU64,
    panels_uploaded: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_run(&self) {
        self.schedules_run.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dashboard_processed(&self) {
        self.dashboards_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dashboard_failed(&self) {
        self.dashboards_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn panels_captured(&self, count: u64) {
        self.panels_captured.fetch_add(count, Ordering::Relaxed);
    }

    pub fn panels_uploaded(&self, count: u64) {
        self.panels_uploaded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            schedules_run: self.schedules_run.load(Ordering::Relaxed),
            dashboards_processed: self.dashboards_processed.load(Ordering::Relaxed),
            dashboards_failed: self.dashboards_failed.load(Ordering::Relaxed),
            panels_captured: self.panels_captured.load(Ordering::Relaxed),
            panels_uploaded: self.panels_uploaded.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub schedules_run: u64,
    pub dashboards_processed: u64,
    pub dashboards_failed: u64,
    pub panels_captured: u64,
    pub panels_uploaded: u64,
}
