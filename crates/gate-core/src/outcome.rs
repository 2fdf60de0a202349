//! Gate outcomes and the result returned to the caller.

use crate::proposal::{JudgeVerdict, OptimizerProposal};
use serde::{Deserialize, Serialize};

/// Final classification of a gate run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateOutcome {
    /// Use the original query unchanged.
    Pass,
    /// Use the Optimizer's refined prompt.
    Optimized,
    /// The request is unsafe; the caller must not proceed with any prompt.
    Rejected,
}

impl GateOutcome {
    /// Wire spelling of the outcome.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Optimized => "OPTIMIZED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl std::fmt::Display for GateOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wall-clock time of each external stage call, in milliseconds.
///
/// A stage that never ran, or that failed, reports 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTimings {
    /// Optimizer call latency
    pub optimizer_ms: u64,
    /// Judge call latency
    pub judge_ms: u64,
}

impl StageTimings {
    /// No stage ran.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    /// Only the Optimizer ran.
    #[must_use]
    pub fn optimizer_only(optimizer_ms: u64) -> Self {
        Self {
            optimizer_ms,
            judge_ms: 0,
        }
    }

    /// Both stages ran.
    #[must_use]
    pub fn both(optimizer_ms: u64, judge_ms: u64) -> Self {
        Self {
            optimizer_ms,
            judge_ms,
        }
    }
}

/// Value returned to the caller of the gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    /// Prompt the caller should use: the original query or the refined prompt
    pub effective_prompt: String,

    /// Final classification
    pub outcome: GateOutcome,

    /// True iff `outcome` is `OPTIMIZED`
    pub was_optimized: bool,

    /// True iff `outcome` is `REJECTED`
    pub was_rejected: bool,

    /// Optimizer output, present once the Optimizer stage succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimizer_proposal: Option<OptimizerProposal>,

    /// Judge output, present once the Judge stage succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge_verdict: Option<JudgeVerdict>,

    /// Wall-clock time from start to decision, excluding the audit write
    pub total_time_ms: u64,

    /// Per-stage latencies, as recorded in the audit trail
    pub stage_timings: StageTimings,

    /// Audit record id, present only if the audit sink succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_record_id: Option<String>,
}

impl GateResult {
    /// Create a result; the `was_*` flags are derived from the outcome.
    #[must_use]
    pub fn new(
        outcome: GateOutcome,
        effective_prompt: impl Into<String>,
        total_time_ms: u64,
        stage_timings: StageTimings,
    ) -> Self {
        Self {
            effective_prompt: effective_prompt.into(),
            outcome,
            was_optimized: outcome == GateOutcome::Optimized,
            was_rejected: outcome == GateOutcome::Rejected,
            optimizer_proposal: None,
            judge_verdict: None,
            total_time_ms,
            stage_timings,
            audit_record_id: None,
        }
    }

    /// Attach the Optimizer proposal
    #[must_use]
    pub fn with_proposal(mut self, proposal: OptimizerProposal) -> Self {
        self.optimizer_proposal = Some(proposal);
        self
    }

    /// Attach the Judge verdict
    #[must_use]
    pub fn with_verdict(mut self, verdict: JudgeVerdict) -> Self {
        self.judge_verdict = Some(verdict);
        self
    }

    /// Attach the audit record id
    #[must_use]
    pub fn with_audit_record_id(mut self, id: impl Into<String>) -> Self {
        self.audit_record_id = Some(id.into());
        self
    }

    /// Whether the caller may proceed with `effective_prompt`.
    #[must_use]
    pub fn may_proceed(&self) -> bool {
        !self.was_rejected
    }
}
