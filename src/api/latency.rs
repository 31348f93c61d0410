//! In-memory latency histogram for scoring-request instrumentation.
//! Handlers record time from request receipt to computed scores.

use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;

/// Shared latency stats. Handlers record, the stats endpoint reads.
/// Values stored in microseconds.
pub struct LatencyStats {
    inner: Mutex<hdrhistogram::Histogram<u64>>,
}

#[derive(Debug, Serialize)]
pub struct LatencySummary {
    pub samples: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
}

impl LatencyStats {
    /// Tracks 1us to 100s, 3 significant figures.
    pub fn new() -> Self {
        let histogram = hdrhistogram::Histogram::new_with_bounds(1, 100_000_000, 3)
            .expect("valid histogram bounds");
        Self {
            inner: Mutex::new(histogram),
        }
    }

    pub fn record(&self, d: Duration) {
        let us = d.as_micros().min(u128::from(u64::MAX)) as u64;
        if let Ok(mut h) = self.inner.lock() {
            let _ = h.record(us);
        }
    }

    /// None if no samples have been recorded yet.
    pub fn summary(&self) -> Option<LatencySummary> {
        let h = self.inner.lock().ok()?;
        if h.is_empty() {
            return None;
        }
        Some(LatencySummary {
            samples: h.len(),
            p50_us: h.value_at_quantile(0.5),
            p95_us: h.value_at_quantile(0.95),
            p99_us: h.value_at_quantile(0.99),
        })
    }
}

impl Default for LatencyStats {
    fn default() -> Self {
        Self::new()
    }
}
