//! Error types for the action engine.

use valet_core::error::ValetError;

/// Errors a tool executor can report to the engine.
///
/// The engine converts every variant into a failed [`crate::ActionResult`];
/// executor errors never abort the remaining action sequence.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Tool execution failed: {0}")]
    ToolFailed(String),
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),
}

impl From<EngineError> for ValetError {
    fn from(err: EngineError) -> Self {
        ValetError::Engine(err.to_string())
    }
}
