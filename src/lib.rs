//! # Prompt Gate
//!
//! Two-stage prompt optimization gate for conversational agents.
//!
//! Before a user query reaches an agent, an Optimizer may propose a rewrite
//! of it and a Judge reviews that rewrite. The gate then decides whether the
//! agent sees the rewrite, the original query, or nothing at all. Every
//! failure along the way falls back to the original query, and every decision
//! for a configured agent lands in the audit trail.
//!
//! ## Crates
//!
//! - [`types`]: requests, proposals, verdicts, results and capability traits
//! - [`config`]: layered YAML/TOML configuration with env overrides
//! - [`telemetry`]: tracing setup, audit sinks and outcome statistics
//! - [`agents`]: the orchestrator, decision table, structured adapters and
//!   agent registry
//!
//! ## Usage
//!
//! ```ignore
//! use prompt_gate::prelude::*;
//!
//! let config = load_config().await?;
//! let _provider = init_tracing(&TracingConfig::from(&config.telemetry))?;
//!
//! let gate = GateOrchestrator::builder()
//!     .optimizer(Arc::new(StructuredOptimizer::new(backend.clone())))
//!     .judge(Arc::new(StructuredJudge::new(backend)))
//!     .agent_configs(registry)
//!     .audit_sink(InMemoryAuditStore::new(config.audit.clone()).shared())
//!     .config(config.orchestrator.clone())
//!     .build()?;
//!
//! let result = gate.run_gate(&request).await;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use gate_agents as agents;
pub use gate_config as config;
pub use gate_core as types;
pub use gate_telemetry as telemetry;

/// Commonly used types
pub mod prelude {
    pub use gate_agents::{
        decide, AgentProfile, CompletionBackend, CompletionRequest, GateOrchestrator,
        GateOrchestratorBuilder, GateStatus, InMemoryAgentRegistry, RegistryError,
        StructuredJudge, StructuredOptimizer,
    };
    pub use gate_config::{load_config, GateConfig, OrchestratorConfig};
    pub use gate_core::{
        AgentConfig, AgentConfigLookup, AuditRecord, AuditSink, CapabilityError,
        CapabilityResult, GateError, GateOutcome, GateRequest, GateResult, Judge, JudgeInput,
        JudgeVerdict, Optimizer, OptimizerInput, OptimizerProposal, Recommendation,
    };
    pub use gate_telemetry::{
        init_tracing, shutdown_tracing, CompositeAuditSink, InMemoryAuditStore,
        TracingAuditSink, TracingConfig,
    };
    pub use std::sync::Arc;
    pub use tokio_util::sync::CancellationToken;
}
