//! Structured adapter integration tests
//!
//! Run the full gate over [`StructuredOptimizer`] and [`StructuredJudge`]
//! backed by a scripted completion backend.

use crate::fixtures::*;
use crate::mock_capabilities::*;
use gate_agents::{GateOrchestrator, StructuredJudge, StructuredOptimizer};
use gate_core::GateOutcome;
use gate_telemetry::InMemoryAuditStore;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn structured_gate(backend: Arc<MockCompletionBackend>) -> (GateOrchestrator, Arc<InMemoryAuditStore>) {
    let audit = InMemoryAuditStore::with_capacity(10).shared();
    let gate = GateOrchestrator::builder()
        .optimizer(Arc::new(StructuredOptimizer::new(backend.clone())))
        .judge(Arc::new(StructuredJudge::new(backend)))
        .agent_configs(MockAgentConfigs::standard())
        .audit_sink(audit.clone())
        .build()
        .unwrap();
    (gate, audit)
}

#[tokio::test]
async fn test_structured_gate_optimizes() {
    let backend = MockCompletionBackend::new(
        optimizer_reply_json(),
        judge_reply_json("use_optimized", true),
    );
    let (gate, audit) = structured_gate(backend.clone());

    let result = gate.run_gate(&gated_request(BULK_QUERY)).await;

    assert_eq!(result.outcome, GateOutcome::Optimized);
    assert_eq!(result.effective_prompt, BULK_REFINED);
    assert_eq!(audit.len(), 1);

    let requests = backend.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.expects_json));
    assert!(requests[0].prompt.contains(BULK_QUERY));
    assert!(requests[1].prompt.contains(BULK_REFINED));
}

#[tokio::test]
async fn test_structured_gate_rejects() {
    let backend = MockCompletionBackend::new(
        optimizer_reply_json(),
        judge_reply_json("reject_request", false),
    );
    let (gate, _audit) = structured_gate(backend);

    let result = gate.run_gate(&gated_request(BULK_QUERY)).await;

    assert_eq!(result.outcome, GateOutcome::Rejected);
    assert_eq!(result.effective_prompt, BULK_QUERY);
}

#[tokio::test]
async fn test_malformed_optimizer_output_falls_back() {
    let backend = MockCompletionBackend::new(
        "I would clarify the time range first.",
        judge_reply_json("use_optimized", true),
    );
    let (gate, audit) = structured_gate(backend.clone());

    let result = gate.run_gate(&gated_request(BULK_QUERY)).await;

    assert_eq!(result.outcome, GateOutcome::Pass);
    assert!(result.optimizer_proposal.is_none());
    assert_eq!(backend.requests().len(), 1);
    assert_eq!(audit.len(), 1);
}

#[tokio::test]
async fn test_malformed_judge_output_falls_back() {
    let backend = MockCompletionBackend::new(optimizer_reply_json(), "{\"approved\": \"maybe\"}");
    let (gate, _audit) = structured_gate(backend);

    let result = gate.run_gate(&gated_request(BULK_QUERY)).await;

    assert_eq!(result.outcome, GateOutcome::Pass);
    assert_eq!(result.effective_prompt, BULK_QUERY);
    assert!(result.optimizer_proposal.is_some());
    assert!(result.judge_verdict.is_none());
}

#[tokio::test]
async fn test_unreachable_backend_falls_back() {
    let (gate, _audit) = structured_gate(MockCompletionBackend::unreachable());

    let result = gate.run_gate(&gated_request(BULK_QUERY)).await;

    assert_eq!(result.outcome, GateOutcome::Pass);
    assert_eq!(result.effective_prompt, BULK_QUERY);
    assert_eq!(gate.status().fallbacks, 1);
}
