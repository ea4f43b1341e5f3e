//! Bus-backed approval gate.
//!
//! The standard [`ApprovalHandler`]: registers the gated action with the
//! [`ApprovalRegistry`], announces it on the event bus so a front end can
//! render a prompt, and suspends until the registry entry is resolved
//! out-of-band. A configurable deadline bounds the wait; an elapsed
//! deadline settles the request as expired rather than leaving it pending
//! forever.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use valet_bus::EventBus;
use valet_core::config::RedactionConfig;
use valet_core::events::AssistantEvent;
use valet_core::redact::ArgRedactor;
use valet_core::types::{SessionId, Timestamp};

use crate::approval::{ApprovalDecision, ApprovalRegistry, ApprovalRequest};
use crate::engine::ApprovalHandler;
use crate::types::Action;

/// Default bound on how long a gated action waits for a decision.
pub const DEFAULT_APPROVAL_TIMEOUT_SECS: u64 = 300;

/// Configuration for the approval gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Session the gate's events are routed under, if any.
    pub session_id: Option<SessionId>,
    /// Seconds to wait for a decision before expiring the request.
    /// `None` waits indefinitely.
    pub approval_timeout_secs: Option<u64>,
    /// Redaction rules applied to arguments before they reach the bus.
    pub redaction: RedactionConfig,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            session_id: None,
            approval_timeout_secs: Some(DEFAULT_APPROVAL_TIMEOUT_SECS),
            redaction: RedactionConfig::default(),
        }
    }
}

/// Approval gate backed by the registry and the event bus.
pub struct ApprovalGate {
    registry: Arc<ApprovalRegistry>,
    bus: EventBus,
    session_id: Option<SessionId>,
    timeout: Option<Duration>,
    redactor: ArgRedactor,
}

impl ApprovalGate {
    pub fn new(registry: Arc<ApprovalRegistry>, bus: EventBus, config: GateConfig) -> Self {
        Self {
            registry,
            bus,
            session_id: config.session_id,
            timeout: config.approval_timeout_secs.map(Duration::from_secs),
            redactor: ArgRedactor::new(&config.redaction),
        }
    }
}

#[async_trait]
impl ApprovalHandler for ApprovalGate {
    async fn approve(&self, action: &Action) -> ApprovalDecision {
        let risk = action.risk_level();
        let (approval_id, ticket) = self.registry.request(ApprovalRequest {
            tool: action.tool.clone(),
            risk,
            session_id: self.session_id.clone(),
        });

        self.bus.publish(&AssistantEvent::ApprovalRequested {
            approval_id: approval_id.clone(),
            tool: action.tool.clone(),
            risk,
            args: self.redactor.redact(&action.args),
            session_id: self.session_id.clone(),
            timestamp: Timestamp::now(),
        });

        let decision = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, ticket.decision()).await {
                Ok(decision) => decision,
                Err(_) => {
                    // A decision racing the deadline may still win inside the
                    // registry; either way the entry is gone afterwards.
                    self.registry.expire(&approval_id);
                    ApprovalDecision::Expired
                }
            },
            None => ticket.decision().await,
        };

        let event = match decision {
            ApprovalDecision::Expired => {
                tracing::info!(approval_id = %approval_id, tool = %action.tool, "Approval expired");
                AssistantEvent::ApprovalExpired {
                    approval_id,
                    session_id: self.session_id.clone(),
                    timestamp: Timestamp::now(),
                }
            }
            _ => AssistantEvent::ApprovalResolved {
                approval_id,
                approved: decision.is_approved(),
                session_id: self.session_id.clone(),
                timestamp: Timestamp::now(),
            },
        };
        self.bus.publish(&event);

        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;
    use valet_core::types::RiskLevel;

    fn gated_action() -> Action {
        Action::new("calendar.create_event")
            .with_arg("title", json!("T"))
            .with_arg("access_token", json!("abc123"))
            .with_risk(RiskLevel::High)
    }

    /// Captures published events and forwards approval ids to a channel.
    fn watch_approvals(
        bus: &EventBus,
    ) -> (
        Arc<Mutex<Vec<String>>>,
        tokio::sync::mpsc::UnboundedReceiver<String>,
    ) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let sink = Arc::clone(&seen);
        bus.subscribe("*", move |event: &AssistantEvent| {
            sink.lock().unwrap().push(event.event_name().to_string());
            if let AssistantEvent::ApprovalRequested { approval_id, .. } = event {
                let _ = tx.send(approval_id.clone());
            }
        });
        (seen, rx)
    }

    #[tokio::test]
    async fn test_out_of_band_approval() {
        let registry = Arc::new(ApprovalRegistry::new());
        let bus = EventBus::new();
        let (seen, mut rx) = watch_approvals(&bus);
        let gate = Arc::new(ApprovalGate::new(
            Arc::clone(&registry),
            bus,
            GateConfig::default(),
        ));

        let waiter = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { gate.approve(&gated_action()).await })
        };

        let approval_id = rx.recv().await.unwrap();
        assert_eq!(registry.pending_count(), 1);
        assert!(registry.resolve(&approval_id, true));

        assert_eq!(waiter.await.unwrap(), ApprovalDecision::Approved);
        assert_eq!(registry.pending_count(), 0);
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["approval_requested", "approval_resolved"]
        );
    }

    #[tokio::test]
    async fn test_out_of_band_rejection() {
        let registry = Arc::new(ApprovalRegistry::new());
        let bus = EventBus::new();
        let (seen, mut rx) = watch_approvals(&bus);
        let gate = Arc::new(ApprovalGate::new(
            Arc::clone(&registry),
            bus,
            GateConfig::default(),
        ));

        let waiter = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { gate.approve(&gated_action()).await })
        };

        let approval_id = rx.recv().await.unwrap();
        assert!(registry.resolve(&approval_id, false));

        assert_eq!(waiter.await.unwrap(), ApprovalDecision::Rejected);
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["approval_requested", "approval_resolved"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unresolved_approval_expires() {
        let registry = Arc::new(ApprovalRegistry::new());
        let bus = EventBus::new();
        let (seen, _rx) = watch_approvals(&bus);
        let gate = ApprovalGate::new(Arc::clone(&registry), bus, GateConfig::default());

        // Nobody resolves; paused time auto-advances past the deadline.
        let decision = gate.approve(&gated_action()).await;

        assert_eq!(decision, ApprovalDecision::Expired);
        assert_eq!(registry.pending_count(), 0);
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["approval_requested", "approval_expired"]
        );
    }

    #[tokio::test]
    async fn test_published_args_are_redacted() {
        let registry = Arc::new(ApprovalRegistry::new());
        let bus = EventBus::new();
        let captured = Arc::new(Mutex::new(None));
        {
            let captured = Arc::clone(&captured);
            bus.subscribe("*", move |event: &AssistantEvent| {
                if let AssistantEvent::ApprovalRequested { args, .. } = event {
                    *captured.lock().unwrap() = Some(args.clone());
                }
            });
        }
        let gate = Arc::new(ApprovalGate::new(
            Arc::clone(&registry),
            bus,
            GateConfig::default(),
        ));

        let waiter = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { gate.approve(&gated_action()).await })
        };
        // Resolve whatever arrived so the waiter finishes.
        while registry.pending_count() == 0 {
            tokio::task::yield_now().await;
        }
        let id = registry.pending()[0].approval_id.clone();
        registry.resolve(&id, true);
        waiter.await.unwrap();

        let args = captured.lock().unwrap().clone().unwrap();
        assert_eq!(args["access_token"], json!("[redacted]"));
        assert_eq!(args["title"], json!("T"));
    }

    #[tokio::test]
    async fn test_session_id_routed_on_events() {
        let registry = Arc::new(ApprovalRegistry::new());
        let bus = EventBus::new();
        let seen_s1 = Arc::new(Mutex::new(Vec::new()));
        {
            let sink = Arc::clone(&seen_s1);
            bus.subscribe("s1", move |event: &AssistantEvent| {
                sink.lock().unwrap().push(event.event_name().to_string());
            });
        }
        let config = GateConfig {
            session_id: Some(SessionId::from("s1")),
            ..GateConfig::default()
        };
        let gate = Arc::new(ApprovalGate::new(Arc::clone(&registry), bus, config));

        let waiter = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { gate.approve(&gated_action()).await })
        };
        while registry.pending_count() == 0 {
            tokio::task::yield_now().await;
        }
        let id = registry.pending()[0].approval_id.clone();
        registry.resolve(&id, true);
        waiter.await.unwrap();

        assert_eq!(
            *seen_s1.lock().unwrap(),
            vec!["approval_requested", "approval_resolved"]
        );
    }

    #[test]
    fn test_gate_config_default() {
        let config = GateConfig::default();
        assert_eq!(config.approval_timeout_secs, Some(300));
        assert!(config.session_id.is_none());
    }

    #[test]
    fn test_gate_config_serde() {
        let config: GateConfig = serde_json::from_value(json!({
            "session_id": "s1",
            "approval_timeout_secs": 60
        }))
        .unwrap();
        assert_eq!(config.session_id, Some(SessionId::from("s1")));
        assert_eq!(config.approval_timeout_secs, Some(60));
    }
}
