//! In-memory agent registry.
//!
//! Holds the base prompt and gate settings of each conversational agent,
//! answers [`AgentConfigLookup`] for the orchestrator, and promotes an
//! approved rewrite from the audit trail into an agent's base prompt.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gate_core::{AgentConfig, AgentConfigLookup, CapabilityResult, GateOutcome};
use gate_telemetry::InMemoryAuditStore;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::info;

/// Registry errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No audit record with this id
    #[error("Optimization record not found: {0}")]
    RecordNotFound(String),

    /// The record did not produce an optimized prompt
    #[error("Only OPTIMIZED records with optimized prompts can be promoted: {0}")]
    NotPromotable(String),

    /// No active agent with this id
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    /// A base prompt was empty
    #[error("Base prompt cannot be empty")]
    EmptyPrompt,
}

impl RegistryError {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::RecordNotFound(_) => "RECORD_NOT_FOUND",
            Self::NotPromotable(_) => "NOT_PROMOTABLE",
            Self::AgentNotFound(_) => "AGENT_NOT_FOUND",
            Self::EmptyPrompt => "EMPTY_PROMPT",
        }
    }
}

/// A registered conversational agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Agent identifier
    pub agent_id: String,
    /// Current base system prompt
    pub base_prompt: String,
    /// Prompt version, incremented on every prompt change
    pub version: u32,
    /// Whether requests go through the Optimizer/Judge stages
    pub requires_optimization: bool,
    /// Inactive agents are invisible to lookups
    pub is_active: bool,
    /// Audit record the current prompt was promoted from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promoted_from: Option<String>,
    /// When the current prompt was promoted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promoted_at: Option<DateTime<Utc>>,
}

impl AgentProfile {
    /// Create an active profile at version 1
    #[must_use]
    pub fn new(agent_id: impl Into<String>, base_prompt: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            base_prompt: base_prompt.into(),
            version: 1,
            requires_optimization: false,
            is_active: true,
            promoted_from: None,
            promoted_at: None,
        }
    }

    /// Route requests through the gate
    #[must_use]
    pub fn with_optimization(mut self, required: bool) -> Self {
        self.requires_optimization = required;
        self
    }
}

/// Result of a promotion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    /// Agent whose prompt changed
    pub agent_id: String,
    /// Version after the promotion
    pub new_version: u32,
    /// Audit record the prompt came from
    pub promoted_from: String,
}

/// Thread-safe in-memory agent registry
#[derive(Debug, Default)]
pub struct InMemoryAgentRegistry {
    agents: RwLock<HashMap<String, AgentProfile>>,
}

impl InMemoryAgentRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace an agent profile
    pub fn register(&self, profile: AgentProfile) {
        info!(
            agent_id = %profile.agent_id,
            version = profile.version,
            requires_optimization = profile.requires_optimization,
            "Agent registered"
        );
        self.agents.write().insert(profile.agent_id.clone(), profile);
    }

    /// Active profile of an agent
    #[must_use]
    pub fn get(&self, agent_id: &str) -> Option<AgentProfile> {
        self.agents
            .read()
            .get(agent_id)
            .filter(|p| p.is_active)
            .cloned()
    }

    /// All active profiles, sorted by id
    #[must_use]
    pub fn list_active(&self) -> Vec<AgentProfile> {
        let mut profiles: Vec<_> = self
            .agents
            .read()
            .values()
            .filter(|p| p.is_active)
            .cloned()
            .collect();
        profiles.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));
        profiles
    }

    /// Turn the gate on or off for an agent
    pub fn set_requires_optimization(&self, agent_id: &str, required: bool) -> Result<(), RegistryError> {
        self.with_active(agent_id, |profile| {
            profile.requires_optimization = required;
        })
    }

    /// Replace an agent's base prompt and return the new version
    pub fn update_base_prompt(&self, agent_id: &str, base_prompt: impl Into<String>) -> Result<u32, RegistryError> {
        let base_prompt = base_prompt.into();
        if base_prompt.trim().is_empty() {
            return Err(RegistryError::EmptyPrompt);
        }

        let version = self.with_active(agent_id, |profile| {
            profile.base_prompt = base_prompt;
            profile.version += 1;
            profile.promoted_from = None;
            profile.promoted_at = None;
            profile.version
        })?;

        info!(agent_id, new_version = version, "Agent prompt updated");
        Ok(version)
    }

    /// Deactivate an agent; lookups then report it as unconfigured
    pub fn deactivate(&self, agent_id: &str) -> Result<(), RegistryError> {
        self.with_active(agent_id, |profile| {
            profile.is_active = false;
        })?;
        info!(agent_id, "Agent deactivated");
        Ok(())
    }

    /// Promote the optimized prompt of an audit record into its agent's base
    /// prompt.
    pub fn promote_optimization(
        &self,
        store: &InMemoryAuditStore,
        record_id: &str,
    ) -> Result<Promotion, RegistryError> {
        let stored = store
            .get(record_id)
            .ok_or_else(|| RegistryError::RecordNotFound(record_id.to_string()))?;

        let optimized_prompt = match (stored.record.outcome, stored.record.optimized_prompt) {
            (GateOutcome::Optimized, Some(prompt)) if !prompt.is_empty() => prompt,
            _ => return Err(RegistryError::NotPromotable(record_id.to_string())),
        };

        let agent_id = stored.record.agent_id;
        let new_version = self.with_active(&agent_id, |profile| {
            profile.base_prompt = optimized_prompt;
            profile.version += 1;
            profile.promoted_from = Some(record_id.to_string());
            profile.promoted_at = Some(Utc::now());
            profile.version
        })?;

        info!(
            agent_id = %agent_id,
            record_id,
            new_version,
            "Optimization promoted to production"
        );

        Ok(Promotion {
            agent_id,
            new_version,
            promoted_from: record_id.to_string(),
        })
    }

    fn with_active<T>(
        &self,
        agent_id: &str,
        update: impl FnOnce(&mut AgentProfile) -> T,
    ) -> Result<T, RegistryError> {
        let mut agents = self.agents.write();
        match agents.get_mut(agent_id) {
            Some(profile) if profile.is_active => Ok(update(profile)),
            _ => Err(RegistryError::AgentNotFound(agent_id.to_string())),
        }
    }
}

#[async_trait]
impl AgentConfigLookup for InMemoryAgentRegistry {
    async fn lookup_agent_config(&self, agent_id: &str) -> CapabilityResult<Option<AgentConfig>> {
        Ok(self
            .get(agent_id)
            .map(|p| AgentConfig::new(p.agent_id, p.requires_optimization)))
    }
}
