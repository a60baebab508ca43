//! Request metrics collection
//!
//! Lock-free counters shared between the inference service and the HTTP
//! layer. All operations use atomics so the collector can be read
//! concurrently with request processing.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Atomic collector for request-level service metrics
#[derive(Debug, Default)]
pub struct MetricsCollector {
    total_requests: AtomicU64,
    total_errors: AtomicU64,
    total_latency_us: AtomicU64,
}

/// Point-in-time snapshot of collected metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Total requests processed
    pub total_requests: u64,
    /// Requests that ended in an error
    pub total_errors: u64,
    /// Average request latency in milliseconds
    pub avg_latency_ms: f64,
}

impl MetricsCollector {
    /// Creates a new collector with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one completed request and its latency
    pub fn record_request(&self, latency: Duration, is_error: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if is_error {
            self.total_errors.fetch_add(1, Ordering::Relaxed);
        }
        self.total_latency_us
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
    }

    /// Returns a consistent-enough snapshot of the current counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        let total_requests = self.total_requests.load(Ordering::Relaxed);
        let total_latency_us = self.total_latency_us.load(Ordering::Relaxed);

        MetricsSnapshot {
            total_requests,
            total_errors: self.total_errors.load(Ordering::Relaxed),
            avg_latency_ms: if total_requests > 0 {
                total_latency_us as f64 / total_requests as f64 / 1000.0
            } else {
                0.0
            },
        }
    }
}
