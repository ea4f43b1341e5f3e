//! In-process pub/sub for assistant lifecycle events.
//!
//! Fans transient [`AssistantEvent`]s out to interested listeners without
//! persistence or replay. A subscriber registers under a topic: the wildcard
//! `"*"` receives every published event, while any other topic string
//! receives only events whose session routing key equals that topic.
//!
//! Delivery is synchronous and in subscription order; subscribers that join
//! after an event was published never see it.

pub mod bus;

pub use bus::{EventBus, Subscription, WILDCARD_TOPIC};
