//! End-to-end gate tests
//!
//! Verify the decision flow from request to result and audit record,
//! including fallback, shadow runs, cancellation and timeouts.

use crate::fixtures::*;
use crate::mock_capabilities::*;
use gate_agents::GateOrchestrator;
use gate_config::OrchestratorConfig;
use gate_core::{CapabilityError, GateOutcome, Recommendation};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn optimized_gate() -> TestGate {
    TestGate::new(
        MockOptimizer::returning(safety_proposal()),
        MockJudge::returning(verdict(Recommendation::UseOptimized, true)),
    )
}

#[tokio::test]
async fn test_skip_optimization_passes_through() {
    init_tracing();
    let t = optimized_gate();

    for agent in [GATED_AGENT, UNGATED_AGENT, UNKNOWN_AGENT] {
        let result = t.gate.run_gate(&skip_request(agent, BULK_QUERY)).await;
        assert_eq!(result.outcome, GateOutcome::Pass);
        assert_eq!(result.effective_prompt, BULK_QUERY);
        assert_eq!(result.stage_timings.optimizer_ms, 0);
        assert_eq!(result.stage_timings.judge_ms, 0);
    }

    assert_eq!(t.agents.calls(), 0);
    assert_eq!(t.optimizer.calls(), 0);
    assert_eq!(t.judge.calls(), 0);
}

#[tokio::test]
async fn test_unconfigured_agent_is_not_audited() {
    let t = optimized_gate();

    let result = t.gate.run_gate(&gate_request(UNKNOWN_AGENT, BULK_QUERY)).await;

    assert_eq!(result.outcome, GateOutcome::Pass);
    assert_eq!(result.effective_prompt, BULK_QUERY);
    assert!(result.audit_record_id.is_none());
    assert!(t.audit.is_empty());
    assert_eq!(t.optimizer.calls(), 0);
}

#[tokio::test]
async fn test_ungated_agent_is_audited_without_stages() {
    let t = optimized_gate();

    let result = t.gate.run_gate(&gate_request(UNGATED_AGENT, BULK_QUERY)).await;

    assert_eq!(result.outcome, GateOutcome::Pass);
    assert!(result.optimizer_proposal.is_none());
    assert_eq!(t.optimizer.calls(), 0);

    let id = result.audit_record_id.expect("ungated runs are audited");
    let stored = t.audit.get(&id).expect("record stored");
    assert_eq!(stored.record.agent_id, UNGATED_AGENT);
    assert_eq!(stored.record.outcome, GateOutcome::Pass);
}

#[tokio::test]
async fn test_none_proposal_short_circuits_judge() {
    let t = TestGate::new(
        MockOptimizer::returning(none_proposal(SIMPLE_QUERY)),
        MockJudge::returning(verdict(Recommendation::UseOptimized, true)),
    );

    let result = t.gate.run_gate(&gated_request(SIMPLE_QUERY)).await;

    assert_eq!(result.outcome, GateOutcome::Pass);
    assert_eq!(result.effective_prompt, SIMPLE_QUERY);
    assert!(result.optimizer_proposal.is_some());
    assert!(result.judge_verdict.is_none());
    assert_eq!(result.stage_timings.judge_ms, 0);
    assert_eq!(t.judge.calls(), 0);
    assert_eq!(t.audit.len(), 1);
}

#[tokio::test]
async fn test_approved_rewrite_is_optimized() {
    let t = optimized_gate();
    let request = gated_request(BULK_QUERY);

    let result = t.gate.run_gate(&request).await;

    assert_eq!(result.outcome, GateOutcome::Optimized);
    assert!(result.was_optimized);
    assert!(!result.was_rejected);
    assert_eq!(result.effective_prompt, BULK_REFINED);

    // Both stages saw the caller's inputs.
    let optimizer_input = &t.optimizer.inputs()[0];
    assert_eq!(optimizer_input.user_query, BULK_QUERY);
    assert_eq!(optimizer_input.base_prompt, BASE_PROMPT);
    let judge_input = &t.judge.inputs()[0];
    assert_eq!(judge_input.original_prompt, BASE_PROMPT);
    assert_eq!(judge_input.proposal, safety_proposal());

    let stored = t.audit.get(result.audit_record_id.as_deref().unwrap()).unwrap();
    assert_eq!(stored.record.optimized_prompt.as_deref(), Some(BULK_REFINED));
    assert!(stored.record.judge_reasoning.is_some());
}

#[tokio::test]
async fn test_reject_request_is_rejected() {
    for approved in [true, false] {
        let t = TestGate::new(
            MockOptimizer::returning(safety_proposal()),
            MockJudge::returning(verdict(Recommendation::RejectRequest, approved)),
        );

        let result = t.gate.run_gate(&gated_request(BULK_QUERY)).await;

        assert_eq!(result.outcome, GateOutcome::Rejected);
        assert!(result.was_rejected);
        assert!(!result.may_proceed());
        assert_eq!(result.effective_prompt, BULK_QUERY);

        let stored = t.audit.recent(1).remove(0);
        assert!(stored.record.optimized_prompt.is_none());
    }
}

#[tokio::test]
async fn test_disapproval_never_optimizes() {
    for recommendation in [Recommendation::UseOptimized, Recommendation::UseBase] {
        let t = TestGate::new(
            MockOptimizer::returning(safety_proposal()),
            MockJudge::returning(verdict(recommendation, false)),
        );

        let result = t.gate.run_gate(&gated_request(BULK_QUERY)).await;
        assert_eq!(result.outcome, GateOutcome::Pass);
        assert_eq!(result.effective_prompt, BULK_QUERY);
    }
}

#[tokio::test]
async fn test_decision_table_end_to_end() {
    let table = [
        (Recommendation::UseOptimized, true, GateOutcome::Optimized),
        (Recommendation::UseOptimized, false, GateOutcome::Pass),
        (Recommendation::UseBase, true, GateOutcome::Pass),
        (Recommendation::UseBase, false, GateOutcome::Pass),
        (Recommendation::RejectRequest, true, GateOutcome::Rejected),
        (Recommendation::RejectRequest, false, GateOutcome::Rejected),
    ];

    for (recommendation, approved, expected) in table {
        let t = TestGate::new(
            MockOptimizer::returning(safety_proposal()),
            MockJudge::returning(verdict(recommendation, approved)),
        );
        let result = t.gate.run_gate(&gated_request(BULK_QUERY)).await;
        assert_eq!(result.outcome, expected, "{recommendation} approved={approved}");
    }
}

#[tokio::test]
async fn test_optimizer_failure_falls_back() {
    let t = TestGate::new(
        MockOptimizer::failing(CapabilityError::transport("optimizer", "503 from model")),
        MockJudge::returning(verdict(Recommendation::UseOptimized, true)),
    );

    let result = t.gate.run_gate(&gated_request(BULK_QUERY)).await;

    assert_eq!(result.outcome, GateOutcome::Pass);
    assert_eq!(result.effective_prompt, BULK_QUERY);
    assert!(result.optimizer_proposal.is_none());
    assert!(result.judge_verdict.is_none());
    assert_eq!(result.stage_timings.optimizer_ms, 0);
    assert_eq!(t.judge.calls(), 0);

    let stored = t.audit.recent(1).remove(0);
    assert_eq!(stored.record.optimizer_time_ms, 0);
    assert_eq!(t.gate.status().fallbacks, 1);
}

#[tokio::test]
async fn test_judge_failure_keeps_proposal() {
    let t = TestGate::new(
        MockOptimizer::returning(safety_proposal()),
        MockJudge::failing(CapabilityError::malformed("judge", "expected value at line 1")),
    );

    let result = t.gate.run_gate(&gated_request(BULK_QUERY)).await;

    assert_eq!(result.outcome, GateOutcome::Pass);
    assert_eq!(result.effective_prompt, BULK_QUERY);
    assert_eq!(result.optimizer_proposal, Some(safety_proposal()));
    assert!(result.judge_verdict.is_none());
    assert_eq!(result.stage_timings.judge_ms, 0);
    assert!(result.audit_record_id.is_some());
}

#[tokio::test]
async fn test_lookup_failure_treated_as_unconfigured() {
    let audit = MockAuditSink::accepting();
    let optimizer = MockOptimizer::returning(safety_proposal());
    let gate = GateOrchestrator::builder()
        .optimizer(optimizer.clone())
        .judge(MockJudge::returning(verdict(Recommendation::UseOptimized, true)))
        .agent_configs(MockAgentConfigs::failing(CapabilityError::transport(
            "agent_config",
            "registry down",
        )))
        .audit_sink(audit.clone())
        .build()
        .unwrap();

    let result = gate.run_gate(&gated_request(BULK_QUERY)).await;

    assert_eq!(result.outcome, GateOutcome::Pass);
    assert!(result.audit_record_id.is_none());
    assert_eq!(audit.calls(), 0);
    assert_eq!(optimizer.calls(), 0);
}

#[tokio::test]
async fn test_audit_failure_does_not_change_result() {
    let audit = MockAuditSink::failing();
    let gate = GateOrchestrator::builder()
        .optimizer(MockOptimizer::returning(safety_proposal()))
        .judge(MockJudge::returning(verdict(Recommendation::UseOptimized, true)))
        .agent_configs(MockAgentConfigs::standard())
        .audit_sink(audit.clone())
        .build()
        .unwrap();

    let result = gate.run_gate(&gated_request(BULK_QUERY)).await;

    assert_eq!(result.outcome, GateOutcome::Optimized);
    assert_eq!(result.effective_prompt, BULK_REFINED);
    assert!(result.audit_record_id.is_none());
    assert_eq!(audit.calls(), 1);
    assert_eq!(gate.status().audit_failures, 1);
}

#[tokio::test]
async fn test_shadow_run_is_behavior_neutral() {
    let t = optimized_gate();
    let request = gated_request(BULK_QUERY);

    let live = t.gate.run_gate(&request).await;
    let shadow = t.gate.run_shadow_gate(&request).await;

    assert_eq!(live.outcome, shadow.outcome);
    assert_eq!(live.effective_prompt, shadow.effective_prompt);

    let live_record = t.audit.get(live.audit_record_id.as_deref().unwrap()).unwrap();
    let shadow_record = t.audit.get(shadow.audit_record_id.as_deref().unwrap()).unwrap();
    assert!(!live_record.record.is_shadow_run);
    assert!(shadow_record.record.is_shadow_run);
    assert_eq!(t.audit.stats(None).shadow_runs, 1);
}

#[tokio::test]
async fn test_stage_timings_exclude_audit_write() {
    let optimizer_delay = Duration::from_millis(60);
    let judge_delay = Duration::from_millis(40);
    let audit_delay = Duration::from_millis(400);
    let audit = MockAuditSink::slow(audit_delay);
    let gate = GateOrchestrator::builder()
        .optimizer(MockOptimizer::slow(safety_proposal(), optimizer_delay))
        .judge(MockJudge::slow(
            verdict(Recommendation::UseOptimized, true),
            judge_delay,
        ))
        .agent_configs(MockAgentConfigs::standard())
        .audit_sink(audit.clone())
        .build()
        .unwrap();

    let result = gate.run_gate(&gated_request(BULK_QUERY)).await;
    let timings = result.stage_timings;

    assert_eq!(result.outcome, GateOutcome::Optimized);
    assert!(timings.optimizer_ms >= 60, "optimizer_ms = {}", timings.optimizer_ms);
    assert!(timings.judge_ms >= 40, "judge_ms = {}", timings.judge_ms);
    assert!(result.total_time_ms >= timings.optimizer_ms + timings.judge_ms);
    assert!(result.total_time_ms < 400, "total_time_ms = {}", result.total_time_ms);
    assert_eq!(result.audit_record_id.as_deref(), Some("audit-1"));
    assert_eq!(audit.records()[0].total_time_ms, result.total_time_ms);
}

#[tokio::test(start_paused = true)]
async fn test_slow_optimizer_times_out() {
    let t = TestGate::with_config(
        MockOptimizer::slow(safety_proposal(), Duration::from_secs(30)),
        MockJudge::returning(verdict(Recommendation::UseOptimized, true)),
        OrchestratorConfig::default().with_stage_timeout(Duration::from_secs(2)),
    );

    let result = t.gate.run_gate(&gated_request(BULK_QUERY)).await;

    assert_eq!(result.outcome, GateOutcome::Pass);
    assert_eq!(result.effective_prompt, BULK_QUERY);
    assert!(result.optimizer_proposal.is_none());
    assert_eq!(t.judge.calls(), 0);
    assert_eq!(t.audit.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_judge_times_out() {
    let t = TestGate::with_config(
        MockOptimizer::returning(safety_proposal()),
        MockJudge::slow(verdict(Recommendation::UseOptimized, true), Duration::from_secs(30)),
        OrchestratorConfig::default().with_stage_timeout(Duration::from_secs(2)),
    );

    let result = t.gate.run_gate(&gated_request(BULK_QUERY)).await;

    assert_eq!(result.outcome, GateOutcome::Pass);
    assert!(result.optimizer_proposal.is_some());
    assert!(result.judge_verdict.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_abandons_outstanding_stage() {
    let t = TestGate::new(
        MockOptimizer::slow(safety_proposal(), Duration::from_secs(60)),
        MockJudge::returning(verdict(Recommendation::UseOptimized, true)),
    );
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let result = t
        .gate
        .run_gate_with_cancellation(&gated_request(BULK_QUERY), &cancel)
        .await;

    assert_eq!(result.outcome, GateOutcome::Pass);
    assert_eq!(result.effective_prompt, BULK_QUERY);
    assert_eq!(t.judge.calls(), 0);
    // The audit write still happens after cancellation.
    assert!(result.audit_record_id.is_some());
}

#[tokio::test]
async fn test_concurrent_runs_are_isolated() {
    let t = Arc::new(optimized_gate());

    let runs = (0..16).map(|i| {
        let t = t.clone();
        async move {
            let request = if i % 2 == 0 {
                gated_request(BULK_QUERY)
            } else {
                skip_request(GATED_AGENT, SIMPLE_QUERY)
            };
            t.gate.run_gate(&request).await
        }
    });
    let results = futures::future::join_all(runs).await;

    let optimized = results
        .iter()
        .filter(|r| r.outcome == GateOutcome::Optimized)
        .count();
    assert_eq!(optimized, 8);
    for result in results.iter().filter(|r| r.outcome == GateOutcome::Pass) {
        assert_eq!(result.effective_prompt, SIMPLE_QUERY);
    }

    let status = t.gate.status();
    assert_eq!(status.runs, 16);
    assert_eq!(status.optimized, 8);
    assert_eq!(status.passed, 8);
    assert_eq!(t.audit.len(), 16);
    assert_eq!(t.optimizer.calls(), 8);
}
