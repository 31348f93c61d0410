//! Shared health state for the /health endpoint.
//! Updated by the API handlers and the SnapshotWriter.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

/// Shared health metrics. Scoring components update, API reads.
#[derive(Default)]
pub struct HealthState {
    /// True when an oracle endpoint is configured.
    pub oracle_configured: AtomicBool,
    /// Running count of failed oracle calls.
    pub oracle_failures: AtomicU64,
    /// Nanosecond timestamp of the last completed scoring request (0 = none).
    pub last_score_at_ns: AtomicI64,
    /// Approximate count of snapshots queued for DB write.
    pub snapshots_pending: AtomicU64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_oracle_configured(&self, v: bool) {
        self.oracle_configured.store(v, Ordering::Relaxed);
    }

    pub fn inc_oracle_failures(&self) {
        self.oracle_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_last_score_at_ns(&self, ns: i64) {
        self.last_score_at_ns.store(ns, Ordering::Relaxed);
    }

    pub fn inc_snapshots_pending(&self) {
        self.snapshots_pending.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec_snapshots_pending(&self) {
        let _ = self.snapshots_pending.fetch_update(
            Ordering::Relaxed,
            Ordering::Relaxed,
            |v| v.checked_sub(1),
        );
    }

    pub fn oracle_configured(&self) -> bool {
        self.oracle_configured.load(Ordering::Relaxed)
    }

    pub fn oracle_failures(&self) -> u64 {
        self.oracle_failures.load(Ordering::Relaxed)
    }

    pub fn last_score_at_ns(&self) -> i64 {
        self.last_score_at_ns.load(Ordering::Relaxed)
    }

    pub fn snapshots_pending(&self) -> u64 {
        self.snapshots_pending.load(Ordering::Relaxed)
    }
}
