//! Audit trail integration tests
//!
//! Records produced by real gate runs, stored and queried through the
//! in-memory store and fanned out through the composite sink.

use crate::fixtures::*;
use crate::mock_capabilities::*;
use gate_agents::GateOrchestrator;
use gate_config::AuditConfig;
use gate_core::{GateOutcome, IntentCategory, OptimizationType, Recommendation, RiskLevel};
use gate_telemetry::{CompositeAuditSink, InMemoryAuditStore, TracingAuditSink};
use pretty_assertions::assert_eq;
use std::sync::Arc;

#[tokio::test]
async fn test_record_reflects_run() {
    let t = TestGate::new(
        MockOptimizer::returning(safety_proposal()),
        MockJudge::returning(verdict(Recommendation::UseOptimized, true)),
    );
    let request = gated_request(BULK_QUERY);

    let result = t.gate.run_gate(&request).await;
    let record = t.audit.get(result.audit_record_id.as_deref().unwrap()).unwrap().record;

    assert_eq!(record.user_id, "user-42");
    assert_eq!(record.agent_id, GATED_AGENT);
    assert_eq!(record.user_query, BULK_QUERY);
    assert_eq!(record.original_prompt, BASE_PROMPT);
    assert_eq!(record.outcome, GateOutcome::Optimized);
    assert_eq!(record.user_intent_category, IntentCategory::BulkOperation);
    assert_eq!(record.metadata.optimizer_confidence, Some(0.88));
    assert_eq!(
        record.metadata.optimization_type,
        Some(OptimizationType::SafetyEnhancement)
    );
    assert_eq!(record.metadata.judge_risk_level, Some(RiskLevel::Medium));
    assert_eq!(record.total_time_ms, result.total_time_ms);
    assert_eq!(record.inputs_hash, request.inputs_hash());
}

#[tokio::test]
async fn test_history_and_stats_per_agent() {
    let t = TestGate::new(
        MockOptimizer::returning(safety_proposal()),
        MockJudge::returning(verdict(Recommendation::UseOptimized, true)),
    );

    for _ in 0..3 {
        t.gate.run_gate(&gated_request(BULK_QUERY)).await;
    }
    t.gate.run_gate(&gate_request(UNGATED_AGENT, SIMPLE_QUERY)).await;
    t.gate.run_gate(&skip_request(GATED_AGENT, SIMPLE_QUERY)).await;

    let history = t.audit.history(GATED_AGENT, None);
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].record.user_query, SIMPLE_QUERY);

    let stats = t.audit.stats(Some(GATED_AGENT));
    assert_eq!(stats.total, 4);
    assert_eq!(stats.optimized, 3);
    assert_eq!(stats.passed, 1);
    assert!((stats.optimization_rate - 75.0).abs() < f64::EPSILON);

    let all = t.audit.stats(None);
    assert_eq!(all.total, 5);
    assert_eq!(t.audit.by_outcome(GateOutcome::Optimized, 10).len(), 3);
}

#[tokio::test]
async fn test_store_evicts_oldest_records() {
    let audit = InMemoryAuditStore::with_capacity(2).shared();
    let gate = GateOrchestrator::builder()
        .optimizer(MockOptimizer::returning(safety_proposal()))
        .judge(MockJudge::returning(verdict(Recommendation::UseBase, true)))
        .agent_configs(MockAgentConfigs::standard())
        .audit_sink(audit.clone())
        .build()
        .unwrap();

    let first = gate.run_gate(&gated_request(BULK_QUERY)).await;
    gate.run_gate(&gated_request(BULK_QUERY)).await;
    gate.run_gate(&gated_request(BULK_QUERY)).await;

    assert_eq!(audit.len(), 2);
    assert!(audit.get(first.audit_record_id.as_deref().unwrap()).is_none());
}

#[tokio::test]
async fn test_disabled_store_leaves_result_unaudited() {
    let audit = InMemoryAuditStore::new(AuditConfig {
        enabled: false,
        ..AuditConfig::default()
    })
    .shared();
    let gate = GateOrchestrator::builder()
        .optimizer(MockOptimizer::returning(safety_proposal()))
        .judge(MockJudge::returning(verdict(Recommendation::UseOptimized, true)))
        .agent_configs(MockAgentConfigs::standard())
        .audit_sink(audit.clone())
        .build()
        .unwrap();

    let result = gate.run_gate(&gated_request(BULK_QUERY)).await;

    assert_eq!(result.outcome, GateOutcome::Optimized);
    assert!(result.audit_record_id.is_none());
    assert!(audit.is_empty());
    assert_eq!(gate.status().audit_failures, 1);
}

#[tokio::test]
async fn test_composite_sink_survives_failing_member() {
    let failing = MockAuditSink::failing();
    let store = InMemoryAuditStore::with_capacity(10).shared();
    let sink = CompositeAuditSink::new()
        .with_sink(failing.clone())
        .with_sink(store.clone())
        .with_sink(Arc::new(TracingAuditSink::new()));

    let gate = GateOrchestrator::builder()
        .optimizer(MockOptimizer::returning(safety_proposal()))
        .judge(MockJudge::returning(verdict(Recommendation::UseOptimized, true)))
        .agent_configs(MockAgentConfigs::standard())
        .audit_sink(Arc::new(sink))
        .build()
        .unwrap();

    let result = gate.run_gate(&gated_request(BULK_QUERY)).await;

    assert!(result.audit_record_id.is_some());
    assert_eq!(failing.calls(), 1);
    assert_eq!(store.len(), 1);
}
