//! Vendor-agnostic Optimizer and Judge adapters.
//!
//! A vendor only has to implement [`CompletionBackend`]: take a system
//! instruction and a prompt, return the raw model text. The adapters render
//! the role prompt, pull the JSON object out of the reply, deserialize it and
//! validate it. Any problem along the way surfaces as a [`CapabilityError`],
//! so the orchestrator's fallback path handles it.

use crate::instructions::{JUDGE_INSTRUCTIONS, OPTIMIZER_INSTRUCTIONS};
use async_trait::async_trait;
use gate_core::{
    CapabilityError, CapabilityResult, Judge, JudgeInput, JudgeVerdict, OptimizationType,
    Optimizer, OptimizerInput, OptimizerProposal,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};
use validator::Validate;

/// Characters of unparseable output kept in logs.
const RESPONSE_PREVIEW_LENGTH: usize = 200;

/// One request to a text completion backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// System instruction for the role
    pub system_instruction: String,
    /// User-turn prompt
    pub prompt: String,
    /// Ask the backend for a JSON response, if it supports that
    pub expects_json: bool,
}

impl CompletionRequest {
    /// A request expecting a JSON reply
    #[must_use]
    pub fn json(system_instruction: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            prompt: prompt.into(),
            expects_json: true,
        }
    }
}

/// Text completion backend implemented once per model vendor.
#[async_trait]
pub trait CompletionBackend: Send + Sync + std::fmt::Debug {
    /// Complete the request and return the raw response text.
    async fn complete(&self, request: &CompletionRequest) -> CapabilityResult<String>;
}

/// Pull a JSON object out of model output.
///
/// Accepts a fenced ```json block, a bare fence starting with `{`, or the
/// span from the first `{` to the last `}`.
#[must_use]
pub fn extract_json(text: &str) -> Option<&str> {
    if let Some(start) = text.find("```json") {
        let rest = &text[start + "```json".len()..];
        if let Some(end) = rest.find("```") {
            let candidate = rest[..end].trim();
            if !candidate.is_empty() {
                return Some(candidate);
            }
        }
    }

    if let Some(start) = text.find("```\n{") {
        let rest = &text[start + "```\n".len()..];
        if let Some(end) = rest.find("```") {
            let candidate = rest[..end].trim();
            if !candidate.is_empty() {
                return Some(candidate);
            }
        }
    }

    let open = text.find('{')?;
    let close = text.rfind('}')?;
    (close > open).then(|| &text[open..=close])
}

fn preview(text: &str) -> String {
    text.chars().take(RESPONSE_PREVIEW_LENGTH).collect()
}

fn parse_structured<T: DeserializeOwned>(capability: &str, text: &str) -> CapabilityResult<T> {
    let Some(json) = extract_json(text) else {
        warn!(
            capability,
            response = %preview(text),
            "No JSON object in model output"
        );
        return Err(CapabilityError::malformed(capability, "no JSON object in output"));
    };

    serde_json::from_str(json).map_err(|e| {
        warn!(
            capability,
            error = %e,
            response = %preview(text),
            "Failed to parse model output"
        );
        CapabilityError::malformed(capability, e.to_string())
    })
}

/// Optimizer backed by a completion model.
#[derive(Debug)]
pub struct StructuredOptimizer<B> {
    backend: Arc<B>,
}

impl<B: CompletionBackend> StructuredOptimizer<B> {
    /// Create an optimizer over `backend`
    #[must_use]
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Render the user-turn prompt for one request.
    #[must_use]
    pub fn render_prompt(input: &OptimizerInput) -> String {
        let context = input
            .user_context
            .as_deref()
            .map(|c| format!("<user_context>{c}</user_context>\n"))
            .unwrap_or_default();

        format!(
            "<user_query>{}</user_query>\n\
             <base_system_prompt>{}</base_system_prompt>\n\
             {context}\n\
             Analyze this request and determine if the base prompt needs optimization.\n\
             Return your analysis as JSON matching the output format specified in the instructions.",
            input.user_query, input.base_prompt,
        )
    }
}

#[async_trait]
impl<B: CompletionBackend> Optimizer for StructuredOptimizer<B> {
    async fn optimize(&self, input: &OptimizerInput) -> CapabilityResult<OptimizerProposal> {
        let capability = self.name();
        debug!(
            query_len = input.user_query.len(),
            has_context = input.user_context.is_some(),
            "Running optimization analysis"
        );

        let request = CompletionRequest::json(OPTIMIZER_INSTRUCTIONS, Self::render_prompt(input));
        let text = self.backend.complete(&request).await?;

        let mut proposal: OptimizerProposal = parse_structured(capability, &text)?;
        proposal
            .validate()
            .map_err(|e| CapabilityError::schema(capability, e.to_string()))?;

        // "none" means the query goes through untouched.
        if proposal.optimization_type == OptimizationType::None
            && proposal.refined_prompt != input.user_query
        {
            debug!("Normalising refined prompt of a none-type proposal");
            proposal.refined_prompt.clone_from(&input.user_query);
        }

        debug!(
            optimization_type = %proposal.optimization_type,
            confidence = proposal.confidence,
            intent = %proposal.detected_intent_category,
            "Optimization complete"
        );
        Ok(proposal)
    }
}

/// Judge backed by a completion model.
#[derive(Debug)]
pub struct StructuredJudge<B> {
    backend: Arc<B>,
}

impl<B: CompletionBackend> StructuredJudge<B> {
    /// Create a judge over `backend`
    #[must_use]
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Render the user-turn prompt for one review.
    pub fn render_prompt(input: &JudgeInput) -> CapabilityResult<String> {
        let proposal = serde_json::to_string_pretty(&input.proposal)
            .map_err(|e| CapabilityError::internal("judge", e.to_string()))?;

        Ok(format!(
            "<user_query>{}</user_query>\n\
             <original_prompt>{}</original_prompt>\n\
             <optimizer_proposal>\n{proposal}\n</optimizer_proposal>\n\n\
             Review the proposal and return your verdict as JSON matching the output format specified in the instructions.",
            input.user_query, input.original_prompt,
        ))
    }
}

#[async_trait]
impl<B: CompletionBackend> Judge for StructuredJudge<B> {
    async fn judge(&self, input: &JudgeInput) -> CapabilityResult<JudgeVerdict> {
        let capability = self.name();
        let request = CompletionRequest::json(JUDGE_INSTRUCTIONS, Self::render_prompt(input)?);
        let text = self.backend.complete(&request).await?;

        let verdict: JudgeVerdict = parse_structured(capability, &text)?;
        debug!(
            approved = verdict.approved,
            risk_level = %verdict.risk_level,
            recommendation = %verdict.recommendation,
            "Judge verdict received"
        );
        Ok(verdict)
    }
}
