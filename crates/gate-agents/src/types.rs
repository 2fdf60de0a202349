//! Status types for the gate orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Orchestrator version
pub const GATE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Snapshot of orchestrator counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateStatus {
    /// Orchestrator version
    pub version: String,
    /// When the orchestrator was built
    pub started_at: DateTime<Utc>,
    /// Completed runs
    pub runs: u64,
    /// Runs that ended in `PASS`
    pub passed: u64,
    /// Runs that ended in `OPTIMIZED`
    pub optimized: u64,
    /// Runs that ended in `REJECTED`
    pub rejected: u64,
    /// Runs that took the fallback path after a stage failure
    pub fallbacks: u64,
    /// Audit writes that failed
    pub audit_failures: u64,
    /// Mean caller-visible latency
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_latency_ms: Option<f64>,
}

impl GateStatus {
    /// Uptime in seconds
    #[must_use]
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }

    /// Share of runs that fell back, 0.0 - 1.0
    #[must_use]
    pub fn fallback_rate(&self) -> f64 {
        if self.runs == 0 {
            0.0
        } else {
            self.fallbacks as f64 / self.runs as f64
        }
    }
}

/// Internal run counters
#[derive(Debug, Default)]
pub(crate) struct GateStats {
    pub(crate) runs: AtomicU64,
    pub(crate) passed: AtomicU64,
    pub(crate) optimized: AtomicU64,
    pub(crate) rejected: AtomicU64,
    pub(crate) fallbacks: AtomicU64,
    pub(crate) audit_failures: AtomicU64,
    pub(crate) total_latency_ms: AtomicU64,
}

impl GateStats {
    pub(crate) fn snapshot(&self, started_at: DateTime<Utc>) -> GateStatus {
        let runs = self.runs.load(Ordering::Relaxed);
        let total_latency = self.total_latency_ms.load(Ordering::Relaxed);

        GateStatus {
            version: GATE_VERSION.to_string(),
            started_at,
            runs,
            passed: self.passed.load(Ordering::Relaxed),
            optimized: self.optimized.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            audit_failures: self.audit_failures.load(Ordering::Relaxed),
            avg_latency_ms: if runs > 0 {
                Some(total_latency as f64 / runs as f64)
            } else {
                None
            },
        }
    }
}
