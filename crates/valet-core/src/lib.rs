pub mod config;
pub mod error;
pub mod events;
pub mod redact;
pub mod types;

pub use config::ValetConfig;
pub use error::{Result, ValetError};
pub use events::AssistantEvent;
pub use redact::{ArgRedactor, REDACTED};
pub use types::*;
