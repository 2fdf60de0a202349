//! # Gate Agents
//!
//! The prompt optimization gate and its collaborators.
//!
//! This crate provides:
//! - [`GateOrchestrator`]: runs the Optimizer/Judge pipeline with fail-safe
//!   fallback and audits each decision
//! - [`decide`]: the Judge decision table
//! - [`StructuredOptimizer`] / [`StructuredJudge`]: vendor-agnostic adapters
//!   over any [`CompletionBackend`]
//! - [`InMemoryAgentRegistry`]: per-agent gate settings and prompt promotion
//!
//! ## Example
//!
//! ```ignore
//! use gate_agents::{GateOrchestrator, InMemoryAgentRegistry, AgentProfile};
//! use gate_core::GateRequest;
//!
//! let registry = Arc::new(InMemoryAgentRegistry::new());
//! registry.register(AgentProfile::new("calendar", base_prompt).with_optimization(true));
//!
//! let gate = GateOrchestrator::builder()
//!     .optimizer(optimizer)
//!     .judge(judge)
//!     .agent_configs(registry)
//!     .build()?;
//!
//! let request = GateRequest::builder()
//!     .user_id("user-1")
//!     .agent_id("calendar")
//!     .user_query("move all my meetings to the morning")
//!     .base_prompt(base_prompt)
//!     .build()?;
//!
//! let result = gate.run_gate(&request).await;
//! if result.may_proceed() {
//!     send_to_agent(&result.effective_prompt).await;
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod decision;
pub mod instructions;
pub mod orchestrator;
pub mod registry;
pub mod structured;
pub mod types;

pub use decision::decide;
pub use orchestrator::{GateOrchestrator, GateOrchestratorBuilder};
pub use registry::{AgentProfile, InMemoryAgentRegistry, Promotion, RegistryError};
pub use structured::{
    extract_json, CompletionBackend, CompletionRequest, StructuredJudge, StructuredOptimizer,
};
pub use types::{GateStatus, GATE_VERSION};
