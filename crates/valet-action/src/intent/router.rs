//! Keyword-based intent routing.
//!
//! Deterministic, stateless classification: a fixed keyword check per
//! intent, first match wins, anything unmatched falls back to `Unknown`.
//! No learning and no ambiguity resolution.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::types::Action;

/// Intents the router can classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    ReadTasks,
    Summarize,
    WebFetch,
    Unknown,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::ReadTasks => write!(f, "read_tasks"),
            Intent::Summarize => write!(f, "summarize"),
            Intent::WebFetch => write!(f, "web_fetch"),
            Intent::Unknown => write!(f, "unknown"),
        }
    }
}

impl std::str::FromStr for Intent {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read_tasks" => Ok(Intent::ReadTasks),
            "summarize" => Ok(Intent::Summarize),
            "web_fetch" => Ok(Intent::WebFetch),
            "unknown" => Ok(Intent::Unknown),
            _ => Err(format!("Unknown intent: {}", s)),
        }
    }
}

/// File the `read_tasks` action list reads.
const TASKS_PATH: &str = "tasks.md";

fn url_regex() -> &'static Regex {
    static URL_RE: OnceLock<Regex> = OnceLock::new();
    URL_RE.get_or_init(|| Regex::new(r"https?://\S+").expect("Invalid URL regex"))
}

/// Stateless keyword classifier over the fixed intent set.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntentRouter;

impl IntentRouter {
    pub fn new() -> Self {
        Self
    }

    /// Classify a message. Checks run in a fixed order and the first hit
    /// wins: a URL (or fetch request) beats task keywords, which beat
    /// summary keywords. Everything else is `Unknown`.
    pub fn classify(&self, text: &str) -> Intent {
        let lower = text.to_lowercase();
        if url_regex().is_match(&lower) || lower.contains("fetch") {
            Intent::WebFetch
        } else if lower.contains("task") || lower.contains("todo") {
            Intent::ReadTasks
        } else if lower.contains("summar") || lower.contains("recap") {
            Intent::Summarize
        } else {
            Intent::Unknown
        }
    }

    /// Extract the first `http(s)://` URL from a message.
    pub fn first_url(&self, text: &str) -> Option<String> {
        url_regex().find(text).map(|m| m.as_str().to_string())
    }

    /// Map a message to its intent's canned action list.
    ///
    /// A `web_fetch` message with no URL still yields a `web.fetch` action;
    /// its `url` argument is JSON null and the executor is expected to
    /// reject the invocation.
    pub fn route(&self, text: &str) -> Vec<Action> {
        match self.classify(text) {
            Intent::ReadTasks => vec![
                Action::new("fs.read").with_arg("path", json!(TASKS_PATH)),
                Action::new("llm.summarize").with_arg("target", json!("tasks")),
            ],
            Intent::Summarize => {
                vec![Action::new("llm.summarize").with_arg("target", json!("recent"))]
            }
            Intent::WebFetch => {
                let url = self
                    .first_url(text)
                    .map(Value::String)
                    .unwrap_or(Value::Null);
                vec![Action::new("web.fetch").with_arg("url", url)]
            }
            Intent::Unknown => Vec::new(),
        }
    }
}
