//! Pending-approval registry.
//!
//! Bridges the engine's in-line wait on a gated action with an externally
//! triggered decision (a UI click, an API call). A request registers a
//! pending record and hands back a ticket; resolving the record by id
//! settles the ticket and removes the record, exactly once.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;
use valet_core::types::{RiskLevel, SessionId, Timestamp};

/// Decision reached for one pending approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    Approved,
    Rejected,
    /// The wait ended without a user decision. Distinct from an explicit
    /// rejection so callers can surface it differently.
    Expired,
}

impl ApprovalDecision {
    pub fn is_approved(&self) -> bool {
        matches!(self, ApprovalDecision::Approved)
    }

    /// Map a yes/no user decision onto a decision value.
    pub fn from_bool(approved: bool) -> Self {
        if approved {
            ApprovalDecision::Approved
        } else {
            ApprovalDecision::Rejected
        }
    }
}

/// Descriptor for a new approval request.
#[derive(Debug, Clone)]
pub struct ApprovalRequest {
    pub tool: String,
    pub risk: RiskLevel,
    pub session_id: Option<SessionId>,
}

/// Snapshot of one unresolved approval.
#[derive(Debug, Clone, Serialize)]
pub struct PendingApproval {
    pub approval_id: String,
    pub tool: String,
    pub risk: RiskLevel,
    pub session_id: Option<SessionId>,
    pub created_at: Timestamp,
}

struct PendingEntry {
    info: PendingApproval,
    tx: oneshot::Sender<ApprovalDecision>,
}

/// Registry of approvals awaiting an external decision.
///
/// Multiple approvals may be pending simultaneously and are resolvable in
/// any order. An id can be settled at most once: the entry is removed on
/// resolution, and a second attempt is a no-op.
#[derive(Default)]
pub struct ApprovalRegistry {
    pending: Mutex<HashMap<String, PendingEntry>>,
}

impl ApprovalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pending approval and return its fresh id plus the ticket
    /// that settles when a decision arrives.
    pub fn request(&self, request: ApprovalRequest) -> (String, ApprovalTicket) {
        let approval_id = Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        let entry = PendingEntry {
            info: PendingApproval {
                approval_id: approval_id.clone(),
                tool: request.tool,
                risk: request.risk,
                session_id: request.session_id,
                created_at: Timestamp::now(),
            },
            tx,
        };
        self.pending
            .lock()
            .unwrap()
            .insert(approval_id.clone(), entry);
        tracing::debug!(approval_id = %approval_id, "Approval requested");
        (approval_id, ApprovalTicket { rx })
    }

    /// Settle a pending approval with a user decision.
    ///
    /// Returns `true` if the id was pending; `false` (with no side effect)
    /// for an unknown or already-resolved id.
    pub fn resolve(&self, approval_id: &str, approved: bool) -> bool {
        self.settle(approval_id, ApprovalDecision::from_bool(approved))
    }

    /// Settle a pending approval as expired.
    pub fn expire(&self, approval_id: &str) -> bool {
        self.settle(approval_id, ApprovalDecision::Expired)
    }

    fn settle(&self, approval_id: &str, decision: ApprovalDecision) -> bool {
        let entry = self.pending.lock().unwrap().remove(approval_id);
        match entry {
            Some(entry) => {
                // The ticket may already be gone (e.g. its wait timed out);
                // the send result is irrelevant either way.
                let _ = entry.tx.send(decision);
                tracing::debug!(approval_id = %approval_id, ?decision, "Approval settled");
                true
            }
            None => false,
        }
    }

    /// Snapshot of all currently unresolved approvals.
    pub fn pending(&self) -> Vec<PendingApproval> {
        self.pending
            .lock()
            .unwrap()
            .values()
            .map(|entry| entry.info.clone())
            .collect()
    }

    /// Number of currently unresolved approvals.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}

/// Receiving half of one approval request.
pub struct ApprovalTicket {
    rx: oneshot::Receiver<ApprovalDecision>,
}

impl ApprovalTicket {
    /// Wait for the decision. Resolves to [`ApprovalDecision::Expired`] if
    /// the registry is dropped before any decision arrives.
    pub async fn decision(self) -> ApprovalDecision {
        self.rx.await.unwrap_or(ApprovalDecision::Expired)
    }
}
