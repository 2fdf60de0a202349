//! Optimizer proposals and Judge verdicts.
//!
//! These are the structured outputs of the two reasoning capabilities. Field
//! names accept both `snake_case` and `camelCase` so that adapters can
//! deserialize model output directly into them.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Kind of rewrite the Optimizer proposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationType {
    /// Clarify ambiguous intent (temporal nuances, vague references).
    IntentClarification,
    /// Inject confirmation or safety requirements for destructive operations.
    SafetyEnhancement,
    /// Add context the base prompt would miss.
    ContextInjection,
    /// The base prompt is sufficient as is.
    None,
}

impl OptimizationType {
    /// All variants, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::IntentClarification,
        Self::SafetyEnhancement,
        Self::ContextInjection,
        Self::None,
    ];

    /// Wire spelling of the variant.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IntentClarification => "intent_clarification",
            Self::SafetyEnhancement => "safety_enhancement",
            Self::ContextInjection => "context_injection",
            Self::None => "none",
        }
    }
}

impl std::fmt::Display for OptimizationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intent category detected in the user query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentCategory {
    /// Creating events or finding time.
    Scheduling,
    /// Removing events.
    Deletion,
    /// Modifying existing events.
    Update,
    /// Looking things up.
    Search,
    /// Operations spanning many events.
    BulkOperation,
    /// Scheduling under explicit constraints.
    ConstraintBased,
    /// Anything else.
    #[default]
    Other,
}

impl IntentCategory {
    /// Wire spelling of the variant.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduling => "scheduling",
            Self::Deletion => "deletion",
            Self::Update => "update",
            Self::Search => "search",
            Self::BulkOperation => "bulk_operation",
            Self::ConstraintBased => "constraint_based",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for IntentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured output of the Optimizer capability.
///
/// When `optimization_type` is [`OptimizationType::None`] the refined prompt
/// equals the original query. That contract belongs to the Optimizer and is
/// not re-checked by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct OptimizerProposal {
    /// Possibly rewritten prompt
    #[serde(alias = "refinedPrompt")]
    pub refined_prompt: String,

    /// Why the base prompt was (in)sufficient
    pub reasoning: String,

    /// Confidence in the proposal (0.0 - 1.0)
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence: f64,

    /// Kind of rewrite
    #[serde(alias = "optimizationType")]
    pub optimization_type: OptimizationType,

    /// Detected intent category
    #[serde(alias = "detectedIntentCategory")]
    pub detected_intent_category: IntentCategory,
}

impl OptimizerProposal {
    /// A proposal that leaves the query untouched.
    #[must_use]
    pub fn unchanged(
        user_query: impl Into<String>,
        reasoning: impl Into<String>,
        detected_intent_category: IntentCategory,
    ) -> Self {
        Self {
            refined_prompt: user_query.into(),
            reasoning: reasoning.into(),
            confidence: 1.0,
            optimization_type: OptimizationType::None,
            detected_intent_category,
        }
    }

    /// Whether the proposal actually changes anything and so warrants a Judge review.
    #[must_use]
    pub fn is_substantive(&self) -> bool {
        self.optimization_type != OptimizationType::None
    }
}

/// Risk level assigned by the Judge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Low risk
    Low,
    /// Medium risk
    Medium,
    /// High risk
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// What the Judge recommends doing with the proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Use the Optimizer's refined prompt.
    UseOptimized,
    /// Keep the original query.
    UseBase,
    /// The request itself is unsafe.
    RejectRequest,
}

impl Recommendation {
    /// All variants, in declaration order.
    pub const ALL: [Self; 3] = [Self::UseOptimized, Self::UseBase, Self::RejectRequest];
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UseOptimized => write!(f, "use_optimized"),
            Self::UseBase => write!(f, "use_base"),
            Self::RejectRequest => write!(f, "reject_request"),
        }
    }
}

/// Structured output of the Judge capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeVerdict {
    /// Whether the proposal is approved
    pub approved: bool,

    /// Judge's reasoning
    pub reasoning: String,

    /// Assessed risk level
    #[serde(alias = "riskLevel")]
    pub risk_level: RiskLevel,

    /// Recommended action
    pub recommendation: Recommendation,
}
