//! The Judge decision table.

use gate_core::{GateOutcome, JudgeVerdict, Recommendation};

/// Map a Judge verdict to the gate outcome.
///
/// `OPTIMIZED` requires both `use_optimized` and `approved`. A rejection
/// recommendation wins regardless of the approval flag. Every other
/// combination degrades to `PASS`.
#[must_use]
pub fn decide(verdict: &JudgeVerdict) -> GateOutcome {
    match (verdict.recommendation, verdict.approved) {
        (Recommendation::RejectRequest, true | false) => GateOutcome::Rejected,
        (Recommendation::UseOptimized, true) => GateOutcome::Optimized,
        (Recommendation::UseOptimized, false) | (Recommendation::UseBase, true | false) => {
            GateOutcome::Pass
        }
    }
}
