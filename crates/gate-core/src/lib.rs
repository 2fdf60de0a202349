//! # Gate Core
//!
//! Core types, capability traits, and error handling for the prompt optimization gate.
//!
//! This crate provides the foundational types used throughout the gate:
//! - The per-run request and result types
//! - Optimizer proposals and Judge verdicts with their closed enums
//! - The audit record handed to audit sinks
//! - Capability traits for the four external collaborators
//! - Error types and handling

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
pub mod capability;
pub mod error;
pub mod outcome;
pub mod proposal;
pub mod request;

// Re-export commonly used types
pub use audit::{AuditMetadata, AuditReceipt, AuditRecord};
pub use capability::{
    AgentConfig, AgentConfigLookup, AuditSink, Judge, JudgeInput, Optimizer, OptimizerInput,
};
pub use error::{CapabilityError, CapabilityResult, GateError};
pub use outcome::{GateOutcome, GateResult, StageTimings};
pub use proposal::{
    IntentCategory, JudgeVerdict, OptimizationType, OptimizerProposal, Recommendation, RiskLevel,
};
pub use request::{GateRequest, GateRequestBuilder};
