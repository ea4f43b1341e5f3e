//! Intent classification for free-text user messages.
//!
//! Maps a message to one of a fixed set of intents, each carrying a canned
//! action list for the engine.

pub mod router;

pub use router::{Intent, IntentRouter};
