//! Outcome statistics over stored decisions.

use gate_core::{AuditRecord, GateOutcome};
use serde::{Deserialize, Serialize};

/// Outcome counts and rates for a set of audit records.
///
/// Rates are percentages and are 0 when there are no records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationStats {
    /// Number of records
    pub total: u64,
    /// `PASS` outcomes
    pub passed: u64,
    /// `OPTIMIZED` outcomes
    pub optimized: u64,
    /// `REJECTED` outcomes
    pub rejected: u64,
    /// Shadow runs among the records
    pub shadow_runs: u64,
    /// Share of `PASS` outcomes, in percent
    pub pass_rate: f64,
    /// Share of `OPTIMIZED` outcomes, in percent
    pub optimization_rate: f64,
    /// Share of `REJECTED` outcomes, in percent
    pub rejection_rate: f64,
    /// Mean total gate latency
    pub avg_total_time_ms: f64,
}

impl OptimizationStats {
    /// Compute statistics from records
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a AuditRecord>) -> Self {
        let mut stats = Self::default();
        let mut total_time_ms = 0u64;

        for record in records {
            stats.total += 1;
            total_time_ms = total_time_ms.saturating_add(record.total_time_ms);
            if record.is_shadow_run {
                stats.shadow_runs += 1;
            }
            match record.outcome {
                GateOutcome::Pass => stats.passed += 1,
                GateOutcome::Optimized => stats.optimized += 1,
                GateOutcome::Rejected => stats.rejected += 1,
            }
        }

        if stats.total > 0 {
            let total = stats.total as f64;
            stats.pass_rate = percent(stats.passed, total);
            stats.optimization_rate = percent(stats.optimized, total);
            stats.rejection_rate = percent(stats.rejected, total);
            stats.avg_total_time_ms = total_time_ms as f64 / total;
        }

        stats
    }
}

fn percent(count: u64, total: f64) -> f64 {
    count as f64 / total * 100.0
}
