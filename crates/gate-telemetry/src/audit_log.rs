//! Audit sinks for gate decisions.
//!
//! - [`TracingAuditSink`] writes each record as a structured log event on
//!   the `audit` target and keeps nothing.
//! - [`InMemoryAuditStore`] keeps the most recent records in a bounded ring
//!   buffer and answers history and statistics queries.
//! - [`CompositeAuditSink`] fans a record out to several sinks.

use crate::stats::OptimizationStats;
use async_trait::async_trait;
use gate_config::AuditConfig;
use gate_core::{AuditReceipt, AuditRecord, AuditSink, CapabilityError, CapabilityResult, GateOutcome};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{info, warn};

const CAPABILITY: &str = "audit_sink";

/// Emit one record on the `audit` target.
fn log_record(id: &str, record: &AuditRecord, include_prompts: bool) {
    if include_prompts {
        info!(
            target: "audit",
            record_id = %id,
            user_id = %record.user_id,
            agent_id = %record.agent_id,
            outcome = %record.outcome,
            intent = %record.user_intent_category,
            shadow = record.is_shadow_run,
            optimizer_ms = record.optimizer_time_ms,
            judge_ms = record.judge_time_ms,
            total_ms = record.total_time_ms,
            user_query = %record.user_query,
            original_prompt = %record.original_prompt,
            optimized_prompt = record.optimized_prompt.as_deref().unwrap_or(""),
            "Gate decision recorded"
        );
    } else {
        info!(
            target: "audit",
            record_id = %id,
            user_id = %record.user_id,
            agent_id = %record.agent_id,
            outcome = %record.outcome,
            intent = %record.user_intent_category,
            shadow = record.is_shadow_run,
            optimizer_ms = record.optimizer_time_ms,
            judge_ms = record.judge_time_ms,
            total_ms = record.total_time_ms,
            inputs_hash = %record.inputs_hash,
            "Gate decision recorded"
        );
    }
}

/// Sink that only emits structured log events.
#[derive(Debug, Clone, Default)]
pub struct TracingAuditSink {
    include_prompts: bool,
}

impl TracingAuditSink {
    /// Create a sink that omits query and prompt text
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Include query and prompt text in events
    #[must_use]
    pub fn with_prompts(mut self, include: bool) -> Self {
        self.include_prompts = include;
        self
    }
}

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record_audit(&self, record: AuditRecord) -> CapabilityResult<AuditReceipt> {
        let id = uuid::Uuid::new_v4().to_string();
        log_record(&id, &record, self.include_prompts);
        Ok(AuditReceipt::new(id))
    }
}

/// A record together with the id the store assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAuditRecord {
    /// Store-assigned identifier
    pub id: String,
    /// The decision record
    pub record: AuditRecord,
}

/// Bounded in-memory audit store.
///
/// Holds at most `capacity` records, and never fewer than one; the oldest
/// record is evicted first.
#[derive(Debug)]
pub struct InMemoryAuditStore {
    config: AuditConfig,
    capacity: usize,
    buffer: RwLock<VecDeque<StoredAuditRecord>>,
}

impl InMemoryAuditStore {
    /// Create a store from audit configuration
    #[must_use]
    pub fn new(config: AuditConfig) -> Self {
        let capacity = config.capacity.max(1);
        Self {
            config,
            capacity,
            buffer: RwLock::new(VecDeque::with_capacity(capacity.min(1024))),
        }
    }

    /// Create with default configuration
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(AuditConfig::default())
    }

    /// Create with a given capacity and no log output
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(AuditConfig {
            capacity,
            log_to_stdout: false,
            ..Default::default()
        })
    }

    /// Create a store that refuses every write
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(AuditConfig {
            enabled: false,
            ..Default::default()
        })
    }

    /// Wrap in an `Arc` for sharing with the orchestrator
    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Check if the store accepts writes
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Number of stored records
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.read().len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.read().is_empty()
    }

    /// Look up a record by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<StoredAuditRecord> {
        self.buffer.read().iter().find(|r| r.id == id).cloned()
    }

    /// Most recent records, newest first
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<StoredAuditRecord> {
        self.buffer.read().iter().rev().take(limit).cloned().collect()
    }

    /// Decision history of one agent, newest first.
    ///
    /// `limit` defaults to the configured history limit.
    #[must_use]
    pub fn history(&self, agent_id: &str, limit: Option<usize>) -> Vec<StoredAuditRecord> {
        let limit = limit.unwrap_or(self.config.history_limit);
        self.buffer
            .read()
            .iter()
            .rev()
            .filter(|r| r.record.agent_id == agent_id)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Outcome statistics, for one agent or for all stored records
    #[must_use]
    pub fn stats(&self, agent_id: Option<&str>) -> OptimizationStats {
        let buffer = self.buffer.read();
        OptimizationStats::from_records(
            buffer
                .iter()
                .map(|r| &r.record)
                .filter(|r| agent_id.map_or(true, |id| r.agent_id == id)),
        )
    }

    /// Records with a given outcome, newest first
    #[must_use]
    pub fn by_outcome(&self, outcome: GateOutcome, limit: usize) -> Vec<StoredAuditRecord> {
        self.buffer
            .read()
            .iter()
            .rev()
            .filter(|r| r.record.outcome == outcome)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Drop every stored record
    pub fn clear(&self) {
        self.buffer.write().clear();
    }

    fn store(&self, stored: StoredAuditRecord) {
        let mut buffer = self.buffer.write();
        while buffer.len() >= self.capacity {
            buffer.pop_front();
        }
        buffer.push_back(stored);
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditStore {
    async fn record_audit(&self, record: AuditRecord) -> CapabilityResult<AuditReceipt> {
        if !self.config.enabled {
            return Err(CapabilityError::unavailable(CAPABILITY, "audit store is disabled"));
        }

        let id = uuid::Uuid::new_v4().to_string();
        if self.config.log_to_stdout {
            log_record(&id, &record, self.config.include_prompts);
        }

        self.store(StoredAuditRecord {
            id: id.clone(),
            record,
        });
        Ok(AuditReceipt::new(id))
    }
}

/// Sink that forwards each record to several sinks in order.
#[derive(Debug, Default)]
pub struct CompositeAuditSink {
    sinks: Vec<Arc<dyn AuditSink>>,
}

impl CompositeAuditSink {
    /// Create an empty composite
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Number of sinks
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether no sink is configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl AuditSink for CompositeAuditSink {
    /// Returns the receipt of the first sink that succeeded.
    async fn record_audit(&self, record: AuditRecord) -> CapabilityResult<AuditReceipt> {
        let mut receipt = None;
        let mut last_error = None;

        for sink in &self.sinks {
            match sink.record_audit(record.clone()).await {
                Ok(r) => {
                    if receipt.is_none() {
                        receipt = Some(r);
                    }
                }
                Err(e) => {
                    warn!(error = %e, code = e.error_code(), "Audit sink failed");
                    last_error = Some(e);
                }
            }
        }

        match (receipt, last_error) {
            (Some(r), _) => Ok(r),
            (None, Some(e)) => Err(e),
            (None, None) => Err(CapabilityError::unavailable(CAPABILITY, "no audit sinks configured")),
        }
    }
}
