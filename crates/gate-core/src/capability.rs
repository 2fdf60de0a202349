//! Capability traits for the gate's external collaborators.
//!
//! The orchestrator is parameterized over these four traits and receives
//! implementations through its builder; vendor-specific Optimizer/Judge
//! backends are adapters behind [`Optimizer`] and [`Judge`].

use crate::audit::{AuditReceipt, AuditRecord};
use crate::error::CapabilityResult;
use crate::proposal::{JudgeVerdict, OptimizerProposal};
use crate::request::GateRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Gate configuration of one conversational agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Agent identifier
    pub agent_id: String,
    /// Whether requests to this agent go through the Optimizer/Judge stages
    pub requires_optimization: bool,
}

impl AgentConfig {
    /// Create an agent configuration
    #[must_use]
    pub fn new(agent_id: impl Into<String>, requires_optimization: bool) -> Self {
        Self {
            agent_id: agent_id.into(),
            requires_optimization,
        }
    }
}

/// Input to the Optimizer capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerInput {
    /// Raw user query
    pub user_query: String,
    /// Base system prompt
    pub base_prompt: String,
    /// Optional user context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_context: Option<String>,
}

impl From<&GateRequest> for OptimizerInput {
    fn from(request: &GateRequest) -> Self {
        Self {
            user_query: request.user_query.clone(),
            base_prompt: request.base_prompt.clone(),
            user_context: request.user_context.clone(),
        }
    }
}

/// Input to the Judge capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeInput {
    /// Raw user query
    pub user_query: String,
    /// Base system prompt the proposal would replace
    pub original_prompt: String,
    /// The Optimizer's proposal under review
    pub proposal: OptimizerProposal,
}

impl JudgeInput {
    /// Build the Judge input for a request and a proposal
    #[must_use]
    pub fn new(request: &GateRequest, proposal: OptimizerProposal) -> Self {
        Self {
            user_query: request.user_query.clone(),
            original_prompt: request.base_prompt.clone(),
            proposal,
        }
    }
}

/// Proposes a clarified or safer rewrite of the prompt.
///
/// Schema validation of the produced proposal is the implementation's job;
/// invalid output must surface as an error, never as a different success.
#[async_trait]
pub trait Optimizer: Send + Sync + std::fmt::Debug {
    /// Name used in logs and errors
    fn name(&self) -> &str {
        "optimizer"
    }

    /// Produce a proposal
    async fn optimize(&self, input: &OptimizerInput) -> CapabilityResult<OptimizerProposal>;
}

/// Reviews an Optimizer proposal for necessity and safety.
#[async_trait]
pub trait Judge: Send + Sync + std::fmt::Debug {
    /// Name used in logs and errors
    fn name(&self) -> &str {
        "judge"
    }

    /// Produce a verdict
    async fn judge(&self, input: &JudgeInput) -> CapabilityResult<JudgeVerdict>;
}

/// Looks up per-agent gate configuration.
#[async_trait]
pub trait AgentConfigLookup: Send + Sync + std::fmt::Debug {
    /// `Ok(None)` when no configuration exists for the agent.
    async fn lookup_agent_config(&self, agent_id: &str) -> CapabilityResult<Option<AgentConfig>>;
}

/// Durably records gate decisions.
///
/// Sinks are shared by every concurrent run and must handle their own write
/// concurrency.
#[async_trait]
pub trait AuditSink: Send + Sync + std::fmt::Debug {
    /// Record one decision and return the id assigned to it.
    async fn record_audit(&self, record: AuditRecord) -> CapabilityResult<AuditReceipt>;
}
