//! Gate Orchestrator
//!
//! Sequences one gate run:
//!
//! 1. Skip check (`skip_optimization` wins over everything else)
//! 2. Agent configuration lookup
//! 3. Optimizer
//! 4. Judge (only for substantive proposals)
//! 5. Decision table
//! 6. Audit write
//!
//! Every stage failure, timeout or cancellation resolves to `PASS` with the
//! original query. A run never returns an error to its caller.

use crate::decision::decide;
use crate::types::{GateStats, GateStatus};
use chrono::{DateTime, Utc};
use gate_config::OrchestratorConfig;
use gate_core::{
    AgentConfigLookup, AuditRecord, AuditSink, CapabilityError, CapabilityResult, GateError,
    GateOutcome, GateRequest, GateResult, Judge, JudgeInput, Optimizer, OptimizerInput,
    StageTimings,
};
use gate_telemetry::TracingAuditSink;
use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn, Span};

const LOOKUP_CAPABILITY: &str = "agent_config_lookup";
const AUDIT_CAPABILITY: &str = "audit_sink";

/// A finished decision, before the audit write.
struct Decision {
    result: GateResult,
    audited: bool,
    fell_back: bool,
}

impl Decision {
    fn audited(result: GateResult) -> Self {
        Self {
            result,
            audited: true,
            fell_back: false,
        }
    }

    fn unaudited(result: GateResult) -> Self {
        Self {
            result,
            audited: false,
            fell_back: false,
        }
    }

    fn fallback(result: GateResult) -> Self {
        Self {
            result,
            audited: true,
            fell_back: true,
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Two-stage prompt optimization gate
pub struct GateOrchestrator {
    optimizer: Arc<dyn Optimizer>,
    judge: Arc<dyn Judge>,
    agent_configs: Arc<dyn AgentConfigLookup>,
    audit_sink: Arc<dyn AuditSink>,
    config: OrchestratorConfig,
    stats: GateStats,
    started_at: DateTime<Utc>,
}

impl std::fmt::Debug for GateOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateOrchestrator")
            .field("optimizer", &self.optimizer.name())
            .field("judge", &self.judge.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GateOrchestrator {
    /// Create a new orchestrator builder
    #[must_use]
    pub fn builder() -> GateOrchestratorBuilder {
        GateOrchestratorBuilder::new()
    }

    /// Run the gate for one request.
    pub async fn run_gate(&self, request: &GateRequest) -> GateResult {
        self.run_gate_with_cancellation(request, &CancellationToken::new())
            .await
    }

    /// Run the gate with the shadow flag forced on.
    ///
    /// The decision is identical to [`run_gate`](Self::run_gate); only the
    /// audit record is tagged.
    pub async fn run_shadow_gate(&self, request: &GateRequest) -> GateResult {
        let shadow = request.clone().into_shadow();
        self.run_gate(&shadow).await
    }

    /// Run the gate, abandoning any outstanding capability call once `cancel`
    /// fires.
    ///
    /// A cancelled stage takes the fallback path. The audit write is still
    /// attempted and is not itself cancelled. Cancellation during the agent
    /// configuration lookup leaves the agent unknown, so that run passes
    /// through unaudited.
    #[instrument(
        skip_all,
        fields(
            gate = %self.config.log_prefix,
            agent_id = %request.agent_id,
            shadow = request.is_shadow_run,
            outcome = tracing::field::Empty,
        )
    )]
    pub async fn run_gate_with_cancellation(
        &self,
        request: &GateRequest,
        cancel: &CancellationToken,
    ) -> GateResult {
        let start = Instant::now();

        info!(
            user_id = %request.user_id,
            query_len = request.user_query.len(),
            has_context = request.user_context.is_some(),
            "Starting optimization check"
        );

        let decision = self.decide_run(request, cancel, start).await;
        self.record_stats(&decision);
        Span::current().record("outcome", decision.result.outcome.as_str());

        if decision.audited {
            self.write_audit(request, decision.result).await
        } else {
            decision.result
        }
    }

    /// Snapshot of the run counters
    #[must_use]
    pub fn status(&self) -> GateStatus {
        self.stats.snapshot(self.started_at)
    }

    /// Orchestrator configuration
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    async fn decide_run(
        &self,
        request: &GateRequest,
        cancel: &CancellationToken,
        start: Instant,
    ) -> Decision {
        let pass = |timings: StageTimings| {
            GateResult::new(
                GateOutcome::Pass,
                request.user_query.clone(),
                elapsed_ms(start),
                timings,
            )
        };

        if request.skip_optimization {
            info!("Optimization skipped by request");
            return Decision::audited(pass(StageTimings::zero()));
        }

        let lookup = self
            .guarded(
                LOOKUP_CAPABILITY,
                cancel,
                self.agent_configs.lookup_agent_config(&request.agent_id),
            )
            .await;

        let agent_config = match lookup {
            Ok(Some(agent_config)) => agent_config,
            Ok(None) => {
                debug!("No agent configuration, passing through unaudited");
                return Decision::unaudited(pass(StageTimings::zero()));
            }
            Err(e) if e.is_cancelled() => {
                info!("Cancelled during agent configuration lookup, passing through unaudited");
                return Decision::unaudited(pass(StageTimings::zero()));
            }
            Err(e) => {
                warn!(
                    code = e.error_code(),
                    error = %e,
                    "Agent configuration lookup failed, treating agent as unconfigured"
                );
                return Decision::unaudited(pass(StageTimings::zero()));
            }
        };

        if !agent_config.requires_optimization {
            debug!("Agent does not require optimization");
            return Decision::audited(pass(StageTimings::zero()));
        }

        let optimizer_input = OptimizerInput::from(request);
        let optimizer_start = Instant::now();
        let optimized = self
            .guarded(
                self.optimizer.name(),
                cancel,
                self.optimizer.optimize(&optimizer_input),
            )
            .await;
        let proposal = match optimized {
            Ok(proposal) => proposal,
            Err(e) => {
                warn!(
                    stage = "optimizer",
                    code = e.error_code(),
                    error = %e,
                    "Optimizer failed, falling back to base prompt"
                );
                return Decision::fallback(pass(StageTimings::zero()));
            }
        };
        let optimizer_ms = elapsed_ms(optimizer_start);

        debug!(
            optimization_type = %proposal.optimization_type,
            confidence = proposal.confidence,
            intent = %proposal.detected_intent_category,
            optimizer_ms,
            "Optimizer proposal received"
        );

        if !proposal.is_substantive() {
            return Decision::audited(
                pass(StageTimings::optimizer_only(optimizer_ms)).with_proposal(proposal),
            );
        }

        let judge_input = JudgeInput::new(request, proposal);
        let judge_start = Instant::now();
        let judged = self
            .guarded(self.judge.name(), cancel, self.judge.judge(&judge_input))
            .await;
        let verdict = match judged {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(
                    stage = "judge",
                    code = e.error_code(),
                    error = %e,
                    "Judge failed, falling back to base prompt"
                );
                return Decision::fallback(
                    pass(StageTimings::optimizer_only(optimizer_ms))
                        .with_proposal(judge_input.proposal),
                );
            }
        };
        let judge_ms = elapsed_ms(judge_start);

        let outcome = decide(&verdict);
        let proposal = judge_input.proposal;
        let effective_prompt = match outcome {
            GateOutcome::Optimized => proposal.refined_prompt.clone(),
            GateOutcome::Pass | GateOutcome::Rejected => request.user_query.clone(),
        };

        info!(
            outcome = %outcome,
            recommendation = %verdict.recommendation,
            approved = verdict.approved,
            risk_level = %verdict.risk_level,
            optimizer_ms,
            judge_ms,
            "Gate decision made"
        );

        Decision::audited(
            GateResult::new(
                outcome,
                effective_prompt,
                elapsed_ms(start),
                StageTimings::both(optimizer_ms, judge_ms),
            )
            .with_proposal(proposal)
            .with_verdict(verdict),
        )
    }

    /// Run one capability call under cancellation and the stage timeout.
    async fn guarded<T, F>(
        &self,
        capability: &str,
        cancel: &CancellationToken,
        call: F,
    ) -> CapabilityResult<T>
    where
        F: Future<Output = CapabilityResult<T>>,
    {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(CapabilityError::cancelled(capability)),
            result = self.bounded(capability, call) => result,
        }
    }

    async fn bounded<T, F>(&self, capability: &str, call: F) -> CapabilityResult<T>
    where
        F: Future<Output = CapabilityResult<T>>,
    {
        match self.config.stage_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or_else(|_| Err(CapabilityError::timeout(capability, limit))),
            None => call.await,
        }
    }

    async fn write_audit(&self, request: &GateRequest, result: GateResult) -> GateResult {
        let record = AuditRecord::from_run(request, &result);

        match self
            .bounded(AUDIT_CAPABILITY, self.audit_sink.record_audit(record))
            .await
        {
            Ok(receipt) => {
                debug!(record_id = %receipt.id, "Audit record written");
                result.with_audit_record_id(receipt.id)
            }
            Err(e) => {
                self.stats.audit_failures.fetch_add(1, Ordering::Relaxed);
                warn!(code = e.error_code(), error = %e, "Failed to write audit record");
                result
            }
        }
    }

    fn record_stats(&self, decision: &Decision) {
        let stats = &self.stats;
        stats.runs.fetch_add(1, Ordering::Relaxed);
        stats
            .total_latency_ms
            .fetch_add(decision.result.total_time_ms, Ordering::Relaxed);
        if decision.fell_back {
            stats.fallbacks.fetch_add(1, Ordering::Relaxed);
        }
        let counter = match decision.result.outcome {
            GateOutcome::Pass => &stats.passed,
            GateOutcome::Optimized => &stats.optimized,
            GateOutcome::Rejected => &stats.rejected,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Builder for `GateOrchestrator`
#[derive(Default)]
pub struct GateOrchestratorBuilder {
    optimizer: Option<Arc<dyn Optimizer>>,
    judge: Option<Arc<dyn Judge>>,
    agent_configs: Option<Arc<dyn AgentConfigLookup>>,
    audit_sink: Option<Arc<dyn AuditSink>>,
    config: OrchestratorConfig,
}

impl GateOrchestratorBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the Optimizer capability
    #[must_use]
    pub fn optimizer(mut self, optimizer: Arc<dyn Optimizer>) -> Self {
        self.optimizer = Some(optimizer);
        self
    }

    /// Set the Judge capability
    #[must_use]
    pub fn judge(mut self, judge: Arc<dyn Judge>) -> Self {
        self.judge = Some(judge);
        self
    }

    /// Set the agent configuration lookup
    #[must_use]
    pub fn agent_configs(mut self, agent_configs: Arc<dyn AgentConfigLookup>) -> Self {
        self.agent_configs = Some(agent_configs);
        self
    }

    /// Set the audit sink (defaults to [`TracingAuditSink`])
    #[must_use]
    pub fn audit_sink(mut self, audit_sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sink = Some(audit_sink);
        self
    }

    /// Set the orchestrator configuration
    #[must_use]
    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the orchestrator
    ///
    /// # Errors
    /// Returns error if a required capability is missing or the stage
    /// timeout is zero
    pub fn build(self) -> Result<GateOrchestrator, GateError> {
        let optimizer = self
            .optimizer
            .ok_or_else(|| GateError::configuration("optimizer is required"))?;
        let judge = self
            .judge
            .ok_or_else(|| GateError::configuration("judge is required"))?;
        let agent_configs = self
            .agent_configs
            .ok_or_else(|| GateError::configuration("agent configuration lookup is required"))?;

        if self.config.stage_timeout.is_some_and(|t| t.is_zero()) {
            return Err(GateError::configuration("stage timeout must be greater than zero"));
        }

        let audit_sink = self
            .audit_sink
            .unwrap_or_else(|| Arc::new(TracingAuditSink::new()));

        Ok(GateOrchestrator {
            optimizer,
            judge,
            agent_configs,
            audit_sink,
            config: self.config,
            stats: GateStats::default(),
            started_at: Utc::now(),
        })
    }
}

impl std::fmt::Debug for GateOrchestratorBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateOrchestratorBuilder")
            .field("has_optimizer", &self.optimizer.is_some())
            .field("has_judge", &self.judge.is_some())
            .field("has_agent_configs", &self.agent_configs.is_some())
            .field("has_audit_sink", &self.audit_sink.is_some())
            .field("config", &self.config)
            .finish()
    }
}
