//! # Gate Telemetry
//!
//! Observability for the prompt optimization gate.
//!
//! This crate provides:
//! - Structured logging and OpenTelemetry tracing setup
//! - Audit sinks: a log-only sink, a bounded in-memory store with history
//!   queries, and a fan-out composite
//! - Outcome statistics over stored decisions

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit_log;
pub mod stats;
pub mod tracing_setup;

pub use audit_log::{CompositeAuditSink, InMemoryAuditStore, StoredAuditRecord, TracingAuditSink};
pub use stats::OptimizationStats;
pub use tracing_setup::{
    init_tracing, shutdown_tracing, LogFormat, SpanExport, TracingConfig, TracingError,
};
