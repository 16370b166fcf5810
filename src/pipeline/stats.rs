//! Pipeline outcome counters.
//!
//! Dispatch results are never returned to the original caller; these counters
//! are the only place an outcome is kept.

use std::sync::atomic::{AtomicU64, Ordering};

use axum::http::StatusCode;

use crate::observability::metrics;
use crate::pipeline::dispatch::DispatchError;

/// Running totals for the asynchronous path.
#[derive(Debug, Default)]
pub struct PipelineStats {
    enqueued: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

/// Point-in-time copy of [`PipelineStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub enqueued: u64,
    pub delivered: u64,
    pub dropped: u64,
}

impl StatsSnapshot {
    /// Jobs whose dispatch has not finished yet (queued or in flight).
    pub fn pending(&self) -> u64 {
        self.enqueued.saturating_sub(self.delivered + self.dropped)
    }
}

impl PipelineStats {
    pub fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
        metrics::record_job_enqueued();
    }

    /// Record a finished dispatch.
    pub fn record_outcome(&self, outcome: &Result<StatusCode, DispatchError>) {
        match outcome {
            Ok(status) => {
                self.delivered.fetch_add(1, Ordering::Relaxed);
                metrics::record_job_delivered(status.as_u16());
            }
            Err(error) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                metrics::record_job_dropped(error.reason());
            }
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}
