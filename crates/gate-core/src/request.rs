//! Request type for one gate run.

use crate::error::GateError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Input to one pipeline run.
///
/// A request is constructed by the caller and treated as immutable for the
/// life of the run; the orchestrator only ever borrows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateRequest {
    /// Requesting user
    pub user_id: String,

    /// Target conversational agent
    pub agent_id: String,

    /// Raw user query (non-empty)
    pub user_query: String,

    /// Base system prompt of the target agent
    pub base_prompt: String,

    /// Optional free-text context about the user or situation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_context: Option<String>,

    /// Tag the audit record as a shadow run
    #[serde(default)]
    pub is_shadow_run: bool,

    /// Bypass the gate entirely
    #[serde(default)]
    pub skip_optimization: bool,
}

impl GateRequest {
    /// Create a new builder for `GateRequest`
    #[must_use]
    pub fn builder() -> GateRequestBuilder {
        GateRequestBuilder::default()
    }

    /// Validate the request
    ///
    /// # Errors
    /// Returns error if an identifier or the user query is empty
    pub fn validate(&self) -> Result<(), GateError> {
        if self.user_id.trim().is_empty() {
            return Err(GateError::validation_field("user_id", "user_id cannot be empty"));
        }

        if self.agent_id.trim().is_empty() {
            return Err(GateError::validation_field("agent_id", "agent_id cannot be empty"));
        }

        if self.user_query.trim().is_empty() {
            return Err(GateError::validation_field(
                "user_query",
                "user_query cannot be empty",
            ));
        }

        Ok(())
    }

    /// The same request, tagged as a shadow run.
    #[must_use]
    pub fn into_shadow(mut self) -> Self {
        self.is_shadow_run = true;
        self
    }

    /// SHA-256 of the serialized request, hex encoded.
    ///
    /// Used by the audit trail to tie a decision back to its exact inputs.
    #[must_use]
    pub fn inputs_hash(&self) -> String {
        let serialized = serde_json::to_string(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(serialized.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Builder for `GateRequest`
#[derive(Debug, Default)]
pub struct GateRequestBuilder {
    user_id: Option<String>,
    agent_id: Option<String>,
    user_query: Option<String>,
    base_prompt: String,
    user_context: Option<String>,
    is_shadow_run: bool,
    skip_optimization: bool,
}

impl GateRequestBuilder {
    /// Set the user ID
    #[must_use]
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the agent ID
    #[must_use]
    pub fn agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    /// Set the user query
    #[must_use]
    pub fn user_query(mut self, user_query: impl Into<String>) -> Self {
        self.user_query = Some(user_query.into());
        self
    }

    /// Set the base system prompt
    #[must_use]
    pub fn base_prompt(mut self, base_prompt: impl Into<String>) -> Self {
        self.base_prompt = base_prompt.into();
        self
    }

    /// Set the user context
    #[must_use]
    pub fn user_context(mut self, user_context: impl Into<String>) -> Self {
        self.user_context = Some(user_context.into());
        self
    }

    /// Mark as shadow run
    #[must_use]
    pub fn shadow_run(mut self, is_shadow_run: bool) -> Self {
        self.is_shadow_run = is_shadow_run;
        self
    }

    /// Skip optimization
    #[must_use]
    pub fn skip_optimization(mut self, skip: bool) -> Self {
        self.skip_optimization = skip;
        self
    }

    /// Build the request
    ///
    /// # Errors
    /// Returns error if required fields are missing or empty
    pub fn build(self) -> Result<GateRequest, GateError> {
        let user_id = self
            .user_id
            .ok_or_else(|| GateError::validation_field("user_id", "user_id is required"))?;
        let agent_id = self
            .agent_id
            .ok_or_else(|| GateError::validation_field("agent_id", "agent_id is required"))?;
        let user_query = self
            .user_query
            .ok_or_else(|| GateError::validation_field("user_query", "user_query is required"))?;

        let request = GateRequest {
            user_id,
            agent_id,
            user_query,
            base_prompt: self.base_prompt,
            user_context: self.user_context,
            is_shadow_run: self.is_shadow_run,
            skip_optimization: self.skip_optimization,
        };

        request.validate()?;

        Ok(request)
    }
}
