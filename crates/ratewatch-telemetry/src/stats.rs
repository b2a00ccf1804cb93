//! Process-lifetime polling statistics.
//!
//! Cheap atomic counters recorded from feed listeners and the output sink,
//! reported through the log periodically and at shutdown.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Counters for polling and output activity.
#[derive(Debug)]
pub struct PollStats {
    fetch_ok: AtomicU64,
    fetch_err: AtomicU64,
    lines_emitted: AtomicU64,
    started_at: DateTime<Utc>,
}

/// Point-in-time view of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub fetch_ok: u64,
    pub fetch_err: u64,
    pub lines_emitted: u64,
}

impl PollStats {
    pub fn new() -> Self {
        Self {
            fetch_ok: AtomicU64::new(0),
            fetch_err: AtomicU64::new(0),
            lines_emitted: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    /// Record a successful poll.
    pub fn record_fetch_ok(&self) {
        self.fetch_ok.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed poll.
    pub fn record_fetch_err(&self) {
        self.fetch_err.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one emitted aggregation line.
    pub fn record_line_emitted(&self) {
        self.lines_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            fetch_ok: self.fetch_ok.load(Ordering::Relaxed),
            fetch_err: self.fetch_err.load(Ordering::Relaxed),
            lines_emitted: self.lines_emitted.load(Ordering::Relaxed),
        }
    }

    /// Log a summary of activity since process start.
    pub fn log_summary(&self) {
        let snapshot = self.snapshot();
        let uptime_secs = (Utc::now() - self.started_at).num_seconds();
        info!(
            uptime_secs,
            fetch_ok = snapshot.fetch_ok,
            fetch_err = snapshot.fetch_err,
            lines_emitted = snapshot.lines_emitted,
            "Poll statistics summary"
        );
    }
}

impl Default for PollStats {
    fn default() -> Self {
        Self::new()
    }
}
