//! Argument redaction for audit payloads.
//!
//! Tool arguments are included in audit events so an operator can see what
//! an action was asked to do, but credential-bearing values must never leave
//! the engine in the clear. Redaction replaces the values of sensitive keys
//! with a fixed marker before the arguments reach any sink or subscriber.
//!
//! Redaction is a shallow, one-level copy: only top-level keys are checked,
//! and objects nested inside argument values are not traversed. Callers that
//! need nested fields protected must flatten them to the top level first.

use serde_json::{Map, Value};

use crate::config::RedactionConfig;

/// Marker substituted for the value of a sensitive argument.
pub const REDACTED: &str = "[redacted]";

/// Key substrings that are always treated as sensitive, matched
/// case-insensitively against the full argument key.
const SENSITIVE_KEY_PARTS: [&str; 2] = ["token", "authorization"];

/// Whether an argument key is sensitive under the built-in rules.
pub fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    SENSITIVE_KEY_PARTS.iter().any(|part| lower.contains(part))
}

/// One-level redaction copy of an argument map under the built-in rules.
pub fn redact_args(args: &Map<String, Value>) -> Map<String, Value> {
    args.iter()
        .map(|(key, value)| {
            if is_sensitive_key(key) {
                (key.clone(), Value::String(REDACTED.to_string()))
            } else {
                (key.clone(), value.clone())
            }
        })
        .collect()
}

/// Redactor carrying configured extra key substrings on top of the built-ins.
#[derive(Debug, Clone, Default)]
pub struct ArgRedactor {
    extra_parts: Vec<String>,
}

impl ArgRedactor {
    /// Build a redactor from configuration. Extra key substrings are
    /// lowercased once here so per-argument checks stay cheap.
    pub fn new(config: &RedactionConfig) -> Self {
        Self {
            extra_parts: config
                .extra_sensitive_keys
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
        }
    }

    /// Whether a key is sensitive under the built-in or configured rules.
    pub fn is_sensitive(&self, key: &str) -> bool {
        if is_sensitive_key(key) {
            return true;
        }
        let lower = key.to_lowercase();
        self.extra_parts.iter().any(|part| lower.contains(part))
    }

    /// One-level redaction copy of an argument map.
    pub fn redact(&self, args: &Map<String, Value>) -> Map<String, Value> {
        args.iter()
            .map(|(key, value)| {
                if self.is_sensitive(key) {
                    (key.clone(), Value::String(REDACTED.to_string()))
                } else {
                    (key.clone(), value.clone())
                }
            })
            .collect()
    }
}
