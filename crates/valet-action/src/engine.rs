//! Action engine.
//!
//! Executes a submitted action list strictly in order, gating medium and
//! high risk actions behind an injected approval handler and reporting
//! every lifecycle step to an injected audit sink.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use valet_core::redact::ArgRedactor;

use crate::approval::ApprovalDecision;
use crate::audit::{event, AuditSink};
use crate::error::EngineError;
use crate::types::{Action, ActionResult, EngineConfig, ExecOutcome};

/// Error string recorded when the user rejects a gated action.
pub const USER_REJECTED: &str = "User rejected";
/// Error string recorded when a gated action's approval wait expires.
pub const APPROVAL_EXPIRED: &str = "Approval expired";
/// Fallback error string when a tool fails without a usable message.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// The external capability that actually performs an action's effect.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Perform the invocation. A returned [`ExecOutcome`] with `ok == false`
    /// is a logical failure; an `Err` is an execution failure. The engine
    /// treats both as terminal per-action outcomes.
    async fn execute(
        &self,
        tool: &str,
        args: &Map<String, Value>,
    ) -> Result<ExecOutcome, EngineError>;
}

/// Decides whether a gated action may proceed.
///
/// How and when the decision resolves is up to the caller; the bus-backed
/// [`crate::ApprovalGate`] is the standard implementation.
#[async_trait]
pub trait ApprovalHandler: Send + Sync {
    async fn approve(&self, action: &Action) -> ApprovalDecision;
}

/// Sequential action executor with a human-in-the-loop gate.
pub struct ActionEngine {
    executor: Arc<dyn ToolExecutor>,
    approver: Arc<dyn ApprovalHandler>,
    audit: Arc<dyn AuditSink>,
    redactor: ArgRedactor,
}

impl ActionEngine {
    /// Create an engine over the injected executor, approver, and sink.
    pub fn new(
        executor: Arc<dyn ToolExecutor>,
        approver: Arc<dyn ApprovalHandler>,
        audit: Arc<dyn AuditSink>,
        config: EngineConfig,
    ) -> Self {
        Self {
            executor,
            approver,
            audit,
            redactor: ArgRedactor::new(&config.redaction),
        }
    }

    /// Execute the actions strictly in order.
    ///
    /// One action fully completes (success, failure, or rejection) before
    /// the next begins. Every submitted action yields exactly one result,
    /// in submission order; no failure aborts the remaining sequence and
    /// nothing propagates out of this call.
    pub async fn run(&self, actions: &[Action]) -> Vec<ActionResult> {
        let mut results = Vec::with_capacity(actions.len());
        for action in actions {
            results.push(self.run_one(action).await);
        }
        results
    }

    async fn run_one(&self, action: &Action) -> ActionResult {
        let started = Instant::now();
        let risk = action.risk_level();

        if risk.requires_approval() {
            self.audit.record(
                event::APPROVAL_REQUESTED,
                json!({
                    "tool": action.tool,
                    "risk": risk,
                    "args": self.redactor.redact(&action.args),
                }),
            );

            match self.approver.approve(action).await {
                ApprovalDecision::Approved => {}
                ApprovalDecision::Rejected => {
                    self.audit
                        .record(event::APPROVAL_REJECTED, json!({"tool": action.tool}));
                    return Self::failed(action, USER_REJECTED, started);
                }
                ApprovalDecision::Expired => {
                    self.audit
                        .record(event::APPROVAL_EXPIRED, json!({"tool": action.tool}));
                    return Self::failed(action, APPROVAL_EXPIRED, started);
                }
            }
        }

        self.audit.record(
            event::TOOL_CALLED,
            json!({
                "tool": action.tool,
                "args": self.redactor.redact(&action.args),
            }),
        );

        match self.invoke_executor(action).await {
            Ok(outcome) if outcome.ok => {
                let duration_ms = elapsed_ms(started);
                self.audit.record(
                    event::COMPLETED,
                    json!({"tool": action.tool, "duration_ms": duration_ms}),
                );
                ActionResult {
                    tool: action.tool.clone(),
                    ok: true,
                    output: outcome.data,
                    error: None,
                    duration_ms,
                }
            }
            Ok(outcome) => {
                let message = outcome.error.unwrap_or_else(|| UNKNOWN_ERROR.to_string());
                self.audit.record(
                    event::ERROR,
                    json!({"tool": action.tool, "error": message}),
                );
                Self::failed(action, &message, started)
            }
            Err(message) => {
                self.audit.record(
                    event::ERROR,
                    json!({"tool": action.tool, "error": message}),
                );
                Self::failed(action, &message, started)
            }
        }
    }

    /// Run the executor on its own task so a panic inside a tool is
    /// contained and surfaces as a failed result rather than unwinding
    /// through `run`.
    async fn invoke_executor(&self, action: &Action) -> Result<ExecOutcome, String> {
        let executor = Arc::clone(&self.executor);
        let tool = action.tool.clone();
        let args = action.args.clone();
        let handle = tokio::spawn(async move { executor.execute(&tool, &args).await });
        match handle.await {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(err)) => Err(err.to_string()),
            Err(join_err) => {
                tracing::warn!(tool = %action.tool, %join_err, "Tool task failed");
                Err(UNKNOWN_ERROR.to_string())
            }
        }
    }

    fn failed(action: &Action, message: &str, started: Instant) -> ActionResult {
        ActionResult {
            tool: action.tool.clone(),
            ok: false,
            output: None,
            error: Some(message.to_string()),
            duration_ms: elapsed_ms(started),
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
