//! Audit sinks for engine lifecycle events.
//!
//! The engine reports every lifecycle step (approval requested/rejected,
//! tool called, completion, error) to an injected sink as a name plus a
//! JSON payload. Arguments in payloads are always pre-redacted by the
//! engine; sinks never see raw credential values.

use std::sync::Mutex;

use serde_json::Value;

/// Names of the audit events the engine emits.
pub mod event {
    pub const APPROVAL_REQUESTED: &str = "approval_requested";
    pub const APPROVAL_REJECTED: &str = "approval_rejected";
    pub const APPROVAL_EXPIRED: &str = "approval_expired";
    pub const TOOL_CALLED: &str = "tool_called";
    pub const COMPLETED: &str = "completed";
    pub const ERROR: &str = "error";
}

/// Fire-and-forget audit sink. The engine never consumes a return value.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &str, payload: Value);
}

/// Sink that writes audit events to the structured log.
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &str, payload: Value) {
        tracing::info!(target: "valet::audit", event = event, payload = %payload, "Audit event");
    }
}

/// Sink that captures audit events in memory, for tests and inspection.
#[derive(Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<(String, Value)>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded (event, payload) pairs, in emission order.
    pub fn records(&self) -> Vec<(String, Value)> {
        self.records.lock().unwrap().clone()
    }

    /// Snapshot of recorded event names, in emission order.
    pub fn event_names(&self) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: &str, payload: Value) {
        self.records
            .lock()
            .unwrap()
            .push((event.to_string(), payload));
    }
}
