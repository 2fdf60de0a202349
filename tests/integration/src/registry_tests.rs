//! Agent registry integration tests
//!
//! The registry as the gate's configuration source, and promotion of an
//! audited rewrite into an agent's base prompt.

use crate::fixtures::*;
use crate::mock_capabilities::*;
use gate_agents::{AgentProfile, GateOrchestrator, InMemoryAgentRegistry, RegistryError};
use gate_core::{GateOutcome, Recommendation};
use gate_telemetry::InMemoryAuditStore;
use pretty_assertions::assert_eq;
use std::sync::Arc;

struct RegistryGate {
    gate: GateOrchestrator,
    registry: Arc<InMemoryAgentRegistry>,
    audit: Arc<InMemoryAuditStore>,
}

fn registry_gate(recommendation: Recommendation, approved: bool) -> RegistryGate {
    let registry = Arc::new(InMemoryAgentRegistry::new());
    registry.register(AgentProfile::new(GATED_AGENT, BASE_PROMPT).with_optimization(true));
    registry.register(AgentProfile::new(UNGATED_AGENT, "You report the weather."));

    let audit = InMemoryAuditStore::with_capacity(50).shared();
    let gate = GateOrchestrator::builder()
        .optimizer(MockOptimizer::returning(safety_proposal()))
        .judge(MockJudge::returning(verdict(recommendation, approved)))
        .agent_configs(registry.clone())
        .audit_sink(audit.clone())
        .build()
        .unwrap();

    RegistryGate {
        gate,
        registry,
        audit,
    }
}

#[tokio::test]
async fn test_registry_drives_gate() {
    let t = registry_gate(Recommendation::UseOptimized, true);

    let result = t.gate.run_gate(&gated_request(BULK_QUERY)).await;
    assert_eq!(result.outcome, GateOutcome::Optimized);

    t.registry.set_requires_optimization(GATED_AGENT, false).unwrap();
    let result = t.gate.run_gate(&gated_request(BULK_QUERY)).await;
    assert_eq!(result.outcome, GateOutcome::Pass);
    assert!(result.optimizer_proposal.is_none());

    t.registry.deactivate(GATED_AGENT).unwrap();
    let result = t.gate.run_gate(&gated_request(BULK_QUERY)).await;
    assert!(result.audit_record_id.is_none());
    assert_eq!(t.audit.len(), 2);
}

#[tokio::test]
async fn test_promote_audited_rewrite() {
    let t = registry_gate(Recommendation::UseOptimized, true);

    let result = t.gate.run_gate(&gated_request(BULK_QUERY)).await;
    let record_id = result.audit_record_id.unwrap();

    let promotion = t.registry.promote_optimization(&t.audit, &record_id).unwrap();
    assert_eq!(promotion.agent_id, GATED_AGENT);
    assert_eq!(promotion.new_version, 2);

    let profile = t.registry.get(GATED_AGENT).unwrap();
    assert_eq!(profile.base_prompt, BULK_REFINED);
    assert_eq!(profile.promoted_from, Some(record_id));
}

#[tokio::test]
async fn test_cannot_promote_base_outcome() {
    let t = registry_gate(Recommendation::UseBase, true);

    let result = t.gate.run_gate(&gated_request(BULK_QUERY)).await;
    let record_id = result.audit_record_id.unwrap();

    let err = t.registry.promote_optimization(&t.audit, &record_id).unwrap_err();
    assert_eq!(err, RegistryError::NotPromotable(record_id));
    assert_eq!(t.registry.get(GATED_AGENT).unwrap().version, 1);
}

#[tokio::test]
async fn test_list_active_agents() {
    let t = registry_gate(Recommendation::UseOptimized, true);

    let ids: Vec<_> = t
        .registry
        .list_active()
        .into_iter()
        .map(|p| p.agent_id)
        .collect();
    assert_eq!(ids, vec![GATED_AGENT.to_string(), UNGATED_AGENT.to_string()]);
}
