use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{RiskLevel, SessionId, Timestamp};

/// All lifecycle events that can occur in the Valet system.
///
/// Events are emitted by the approval gate and the hosting layer and consumed
/// by:
/// - The event bus (for real-time UI updates such as approval prompts)
/// - Cross-context listeners (for reactive behavior)
///
/// Events are transient: they are delivered synchronously to current
/// subscribers and never persisted or replayed.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AssistantEvent {
    // =========================================================================
    // Conversation Events
    // =========================================================================
    /// A user message began processing.
    MessageStarted {
        session_id: SessionId,
        timestamp: Timestamp,
    },

    /// Processing of a user message finished.
    MessageCompleted {
        session_id: SessionId,
        timestamp: Timestamp,
    },

    // =========================================================================
    // Approval Events
    // =========================================================================
    /// A gated action is waiting for a user decision.
    ///
    /// `args` is the redacted copy of the action's arguments; raw argument
    /// values never appear on the bus.
    ApprovalRequested {
        approval_id: String,
        tool: String,
        risk: RiskLevel,
        args: Map<String, Value>,
        session_id: Option<SessionId>,
        timestamp: Timestamp,
    },

    /// A pending approval was decided by the user.
    ApprovalResolved {
        approval_id: String,
        approved: bool,
        session_id: Option<SessionId>,
        timestamp: Timestamp,
    },

    /// A pending approval expired before a decision arrived.
    ApprovalExpired {
        approval_id: String,
        session_id: Option<SessionId>,
        timestamp: Timestamp,
    },
}

impl AssistantEvent {
    /// Returns the timestamp of the event.
    pub fn timestamp(&self) -> Timestamp {
        match self {
            AssistantEvent::MessageStarted { timestamp, .. }
            | AssistantEvent::MessageCompleted { timestamp, .. }
            | AssistantEvent::ApprovalRequested { timestamp, .. }
            | AssistantEvent::ApprovalResolved { timestamp, .. }
            | AssistantEvent::ApprovalExpired { timestamp, .. } => *timestamp,
        }
    }

    /// Returns the session routing key, if the event belongs to a session.
    pub fn session_id(&self) -> Option<&str> {
        match self {
            AssistantEvent::MessageStarted { session_id, .. }
            | AssistantEvent::MessageCompleted { session_id, .. } => Some(session_id.as_str()),
            AssistantEvent::ApprovalRequested { session_id, .. }
            | AssistantEvent::ApprovalResolved { session_id, .. }
            | AssistantEvent::ApprovalExpired { session_id, .. } => {
                session_id.as_ref().map(SessionId::as_str)
            }
        }
    }

    /// Returns a human-readable event name for logging and UI streams.
    pub fn event_name(&self) -> &'static str {
        match self {
            AssistantEvent::MessageStarted { .. } => "message_started",
            AssistantEvent::MessageCompleted { .. } => "message_completed",
            AssistantEvent::ApprovalRequested { .. } => "approval_requested",
            AssistantEvent::ApprovalResolved { .. } => "approval_resolved",
            AssistantEvent::ApprovalExpired { .. } => "approval_expired",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_args() -> Map<String, Value> {
        json!({"title": "T"}).as_object().cloned().unwrap()
    }

    #[test]
    fn test_event_timestamp() {
        let ts = Timestamp::now();
        let event = AssistantEvent::MessageStarted {
            session_id: SessionId::from("s1"),
            timestamp: ts,
        };
        assert_eq!(event.timestamp(), ts);
    }

    #[test]
    fn test_event_name_all_variants() {
        let ts = Timestamp::now();
        let cases: Vec<(AssistantEvent, &str)> = vec![
            (
                AssistantEvent::MessageStarted {
                    session_id: SessionId::from("s1"),
                    timestamp: ts,
                },
                "message_started",
            ),
            (
                AssistantEvent::MessageCompleted {
                    session_id: SessionId::from("s1"),
                    timestamp: ts,
                },
                "message_completed",
            ),
            (
                AssistantEvent::ApprovalRequested {
                    approval_id: "a1".to_string(),
                    tool: "calendar.create_event".to_string(),
                    risk: RiskLevel::High,
                    args: sample_args(),
                    session_id: Some(SessionId::from("s1")),
                    timestamp: ts,
                },
                "approval_requested",
            ),
            (
                AssistantEvent::ApprovalResolved {
                    approval_id: "a1".to_string(),
                    approved: true,
                    session_id: None,
                    timestamp: ts,
                },
                "approval_resolved",
            ),
            (
                AssistantEvent::ApprovalExpired {
                    approval_id: "a1".to_string(),
                    session_id: None,
                    timestamp: ts,
                },
                "approval_expired",
            ),
        ];

        for (event, expected) in cases {
            assert_eq!(event.event_name(), expected);
        }
    }

    #[test]
    fn test_session_id_accessor() {
        let ts = Timestamp::now();
        let event = AssistantEvent::MessageStarted {
            session_id: SessionId::from("s1"),
            timestamp: ts,
        };
        assert_eq!(event.session_id(), Some("s1"));

        let event = AssistantEvent::ApprovalRequested {
            approval_id: "a1".to_string(),
            tool: "fs.read".to_string(),
            risk: RiskLevel::Medium,
            args: Map::new(),
            session_id: Some(SessionId::from("s2")),
            timestamp: ts,
        };
        assert_eq!(event.session_id(), Some("s2"));

        let event = AssistantEvent::ApprovalResolved {
            approval_id: "a1".to_string(),
            approved: false,
            session_id: None,
            timestamp: ts,
        };
        assert_eq!(event.session_id(), None);
    }

    #[test]
    fn test_event_serialization_round_trip() {
        let event = AssistantEvent::ApprovalRequested {
            approval_id: "a1".to_string(),
            tool: "calendar.create_event".to_string(),
            risk: RiskLevel::High,
            args: sample_args(),
            session_id: Some(SessionId::from("s1")),
            timestamp: Timestamp::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("ApprovalRequested"));

        let rt: AssistantEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(rt.event_name(), "approval_requested");
        assert_eq!(rt.timestamp(), event.timestamp());
        if let AssistantEvent::ApprovalRequested { tool, risk, .. } = rt {
            assert_eq!(tool, "calendar.create_event");
            assert_eq!(risk, RiskLevel::High);
        } else {
            panic!("Expected ApprovalRequested variant after deserialization");
        }
    }

    #[test]
    fn test_event_clone() {
        let event = AssistantEvent::ApprovalResolved {
            approval_id: "a1".to_string(),
            approved: true,
            session_id: Some(SessionId::from("s1")),
            timestamp: Timestamp::now(),
        };
        let cloned = event.clone();
        assert_eq!(event.event_name(), cloned.event_name());
        assert_eq!(event.timestamp(), cloned.timestamp());
        assert_eq!(event.session_id(), cloned.session_id());
    }
}
