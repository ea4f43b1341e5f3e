//! Event bus implementation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use valet_core::events::AssistantEvent;

/// Topic that matches every published event.
pub const WILDCARD_TOPIC: &str = "*";

type Handler = Arc<dyn Fn(&AssistantEvent) + Send + Sync>;

struct Registration {
    id: u64,
    topic: String,
    handler: Handler,
}

impl Registration {
    fn matches(&self, event: &AssistantEvent) -> bool {
        self.topic == WILDCARD_TOPIC || event.session_id() == Some(self.topic.as_str())
    }
}

struct BusInner {
    registrations: Mutex<Vec<Registration>>,
    next_id: AtomicU64,
}

/// Synchronous in-process event bus.
///
/// Cheap to clone: clones share the same subscriber list.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create a new bus with no subscribers.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                registrations: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Register a handler under a topic and return its subscription handle.
    ///
    /// The handler stays registered until [`Subscription::unsubscribe`] is
    /// called; dropping the handle does not remove it.
    pub fn subscribe<F>(&self, topic: impl Into<String>, handler: F) -> Subscription
    where
        F: Fn(&AssistantEvent) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let topic = topic.into();
        tracing::debug!(topic = %topic, id, "Subscriber registered");
        self.inner.registrations.lock().unwrap().push(Registration {
            id,
            topic,
            handler: Arc::new(handler),
        });
        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver an event synchronously to all matching current subscribers,
    /// in subscription order. Returns the number of handlers invoked.
    pub fn publish(&self, event: &AssistantEvent) -> usize {
        // Snapshot under the lock, invoke outside it: handlers may subscribe
        // or unsubscribe while running.
        let matching: Vec<Handler> = {
            let registrations = self.inner.registrations.lock().unwrap();
            registrations
                .iter()
                .filter(|r| r.matches(event))
                .map(|r| Arc::clone(&r.handler))
                .collect()
        };

        tracing::trace!(
            event = event.event_name(),
            session = event.session_id().unwrap_or("-"),
            delivered = matching.len(),
            "Event published"
        );

        for handler in &matching {
            handler(event);
        }
        matching.len()
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.registrations.lock().unwrap().len()
    }
}

/// Handle for one subscriber registration.
pub struct Subscription {
    id: u64,
    inner: Weak<BusInner>,
}

impl Subscription {
    /// Remove exactly this registration. Idempotent: calling it again (or
    /// after the bus is gone) is a no-op.
    pub fn unsubscribe(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner
                .registrations
                .lock()
                .unwrap()
                .retain(|r| r.id != self.id);
        }
    }
}
