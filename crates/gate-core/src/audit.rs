//! The durable decision record.
//!
//! One [`AuditRecord`] is built per audited gate run and handed to an
//! [`AuditSink`](crate::capability::AuditSink). Records are write-once;
//! nothing in the gate mutates a record after construction.

use crate::outcome::{GateOutcome, GateResult};
use crate::proposal::{IntentCategory, OptimizationType, RiskLevel};
use crate::request::GateRequest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Supplementary details of the stage outputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditMetadata {
    /// Optimizer confidence, if the Optimizer ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimizer_confidence: Option<f64>,

    /// Optimization type, if the Optimizer ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimization_type: Option<OptimizationType>,

    /// Judge risk level, if the Judge ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge_risk_level: Option<RiskLevel>,
}

/// Decision log entry for one gate run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Requesting user
    pub user_id: String,
    /// Target agent
    pub agent_id: String,
    /// Original user query
    pub user_query: String,
    /// Base system prompt at the time of the run
    pub original_prompt: String,
    /// Refined prompt, only when the outcome is `OPTIMIZED`
    pub optimized_prompt: Option<String>,
    /// Optimizer reasoning
    pub optimization_reason: Option<String>,
    /// Judge reasoning
    pub judge_reasoning: Option<String>,
    /// Final outcome
    pub outcome: GateOutcome,
    /// Detected intent, `other` when no Optimizer output is available
    pub user_intent_category: IntentCategory,
    /// Whether the run was a shadow run
    pub is_shadow_run: bool,
    /// Optimizer stage latency
    pub optimizer_time_ms: u64,
    /// Judge stage latency
    pub judge_time_ms: u64,
    /// Total gate latency
    pub total_time_ms: u64,
    /// Stage output details
    #[serde(default)]
    pub metadata: AuditMetadata,
    /// SHA-256 of the request
    pub inputs_hash: String,
    /// When the record was built
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Build the record for a finished run.
    #[must_use]
    pub fn from_run(request: &GateRequest, result: &GateResult) -> Self {
        let proposal = result.optimizer_proposal.as_ref();
        let verdict = result.judge_verdict.as_ref();

        let optimized_prompt = if result.was_optimized {
            proposal.map(|p| p.refined_prompt.clone())
        } else {
            None
        };

        Self {
            user_id: request.user_id.clone(),
            agent_id: request.agent_id.clone(),
            user_query: request.user_query.clone(),
            original_prompt: request.base_prompt.clone(),
            optimized_prompt,
            optimization_reason: proposal.and_then(|p| non_empty(&p.reasoning)),
            judge_reasoning: verdict.and_then(|v| non_empty(&v.reasoning)),
            outcome: result.outcome,
            user_intent_category: proposal
                .map(|p| p.detected_intent_category)
                .unwrap_or_default(),
            is_shadow_run: request.is_shadow_run,
            optimizer_time_ms: result.stage_timings.optimizer_ms,
            judge_time_ms: result.stage_timings.judge_ms,
            total_time_ms: result.total_time_ms,
            metadata: AuditMetadata {
                optimizer_confidence: proposal.map(|p| p.confidence),
                optimization_type: proposal.map(|p| p.optimization_type),
                judge_risk_level: verdict.map(|v| v.risk_level),
            },
            inputs_hash: request.inputs_hash(),
            created_at: Utc::now(),
        }
    }
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Acknowledgement from an audit sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReceipt {
    /// Identifier the sink assigned to the record
    pub id: String,
}

impl AuditReceipt {
    /// Create a receipt
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}
