//! Lightweight engine metrics
//!
//! Lock-free counters shared across requests via `Arc`. Exporters live
//! outside the core.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Default)]
pub struct EngineMetrics {
    // Throughput
    pub requests_total: AtomicU64,
    pub requests_empty: AtomicU64,

    // Latency
    pub latency_sum_ms: AtomicU64,
    pub latency_count: AtomicU64,

    // Pipeline volume
    pub candidates_ranked: AtomicU64,

    // Batch jobs
    pub recluster_runs: AtomicU64,
}

impl EngineMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_request(&self, latency_ms: u64, returned: usize) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        self.latency_sum_ms.fetch_add(latency_ms, Ordering::Relaxed);
        self.latency_count.fetch_add(1, Ordering::Relaxed);
        if returned == 0 {
            self.requests_empty.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_ranked(&self, count: usize) {
        self.candidates_ranked
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_recluster(&self) {
        self.recluster_runs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn avg_latency_ms(&self) -> f64 {
        let sum = self.latency_sum_ms.load(Ordering::Relaxed);
        let count = self.latency_count.load(Ordering::Relaxed);
        if count == 0 {
            0.0
        } else {
            sum as f64 / count as f64
        }
    }

    pub fn empty_rate(&self) -> f64 {
        let total = self.requests_total.load(Ordering::Relaxed);
        let empty = self.requests_empty.load(Ordering::Relaxed);
        if total == 0 {
            0.0
        } else {
            empty as f64 / total as f64
        }
    }
}
