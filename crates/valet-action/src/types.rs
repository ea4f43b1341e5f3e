//! Core types and value objects for the action engine.
//!
//! Defines actions, their results, and the engine's configuration.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use valet_core::config::RedactionConfig;
use valet_core::types::RiskLevel;

// =============================================================================
// Domain Structs
// =============================================================================

/// A single tool invocation request with an associated risk tier.
///
/// Immutable once submitted to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Name of the tool to invoke, e.g. `fs.read` or `calendar.create_event`.
    pub tool: String,
    /// Arguments passed to the tool executor verbatim.
    #[serde(default)]
    pub args: Map<String, Value>,
    /// Risk tier. Absent means low.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskLevel>,
}

impl Action {
    /// Create an action with no arguments and default (low) risk.
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            args: Map::new(),
            risk: None,
        }
    }

    /// Add one argument.
    pub fn with_arg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.args.insert(key.into(), value);
        self
    }

    /// Set the risk tier.
    pub fn with_risk(mut self, risk: RiskLevel) -> Self {
        self.risk = Some(risk);
        self
    }

    /// The effective risk tier, defaulting to low when unset.
    pub fn risk_level(&self) -> RiskLevel {
        self.risk.unwrap_or_default()
    }
}

/// Outcome reported by a tool executor for one invocation.
///
/// `ok == false` is a logical failure: the tool ran and reported an
/// application-level error rather than raising one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecOutcome {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecOutcome {
    /// A successful outcome carrying the tool's output.
    pub fn success(data: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// A logical failure with an application-supplied message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Per-action result produced by the engine.
///
/// The engine yields exactly one result per submitted action, in submission
/// order, regardless of success, failure, or rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub tool: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock time from action start to result production, in whole ms.
    pub duration_ms: u64,
}

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the action engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Redaction rules applied to arguments before they enter audit payloads.
    pub redaction: RedactionConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_builder() {
        let action = Action::new("fs.read")
            .with_arg("path", json!("a.txt"))
            .with_risk(RiskLevel::Medium);
        assert_eq!(action.tool, "fs.read");
        assert_eq!(action.args["path"], json!("a.txt"));
        assert_eq!(action.risk_level(), RiskLevel::Medium);
    }

    #[test]
    fn test_action_risk_defaults_to_low() {
        let action = Action::new("fs.read");
        assert_eq!(action.risk, None);
        assert_eq!(action.risk_level(), RiskLevel::Low);
    }

    #[test]
    fn test_action_serde_round_trip() {
        let action = Action::new("calendar.create_event")
            .with_arg("title", json!("T"))
            .with_risk(RiskLevel::High);
        let json = serde_json::to_string(&action).unwrap();
        let rt: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(rt.tool, "calendar.create_event");
        assert_eq!(rt.args["title"], json!("T"));
        assert_eq!(rt.risk, Some(RiskLevel::High));
    }

    #[test]
    fn test_action_deserialize_without_risk_or_args() {
        let action: Action = serde_json::from_str(r#"{"tool": "fs.read"}"#).unwrap();
        assert_eq!(action.tool, "fs.read");
        assert!(action.args.is_empty());
        assert_eq!(action.risk_level(), RiskLevel::Low);
    }

    #[test]
    fn test_action_risk_omitted_when_unset() {
        let json = serde_json::to_string(&Action::new("fs.read")).unwrap();
        assert!(!json.contains("risk"));
    }

    #[test]
    fn test_exec_outcome_success() {
        let outcome = ExecOutcome::success(json!("X"));
        assert!(outcome.ok);
        assert_eq!(outcome.data, Some(json!("X")));
        assert!(outcome.error.is_none());
    }

    #[test]
    fn test_exec_outcome_failure() {
        let outcome = ExecOutcome::failure("not found");
        assert!(!outcome.ok);
        assert!(outcome.data.is_none());
        assert_eq!(outcome.error.as_deref(), Some("not found"));
    }

    #[test]
    fn test_exec_outcome_serde_round_trip() {
        let outcome = ExecOutcome::failure("boom");
        let json = serde_json::to_string(&outcome).unwrap();
        let rt: ExecOutcome = serde_json::from_str(&json).unwrap();
        assert!(!rt.ok);
        assert_eq!(rt.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_action_result_serde_round_trip() {
        let result = ActionResult {
            tool: "fs.read".to_string(),
            ok: true,
            output: Some(json!({"bytes": 128})),
            error: None,
            duration_ms: 12,
        };
        let json = serde_json::to_string(&result).unwrap();
        let rt: ActionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(rt.tool, "fs.read");
        assert!(rt.ok);
        assert_eq!(rt.output, Some(json!({"bytes": 128})));
        assert_eq!(rt.duration_ms, 12);
    }

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert!(config.redaction.extra_sensitive_keys.is_empty());
    }

    #[test]
    fn test_engine_config_serde_round_trip() {
        let config = EngineConfig {
            redaction: RedactionConfig {
                extra_sensitive_keys: vec!["secret".to_string()],
            },
        };
        let json = serde_json::to_string(&config).unwrap();
        let rt: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(rt.redaction.extra_sensitive_keys, vec!["secret"]);
    }
}
