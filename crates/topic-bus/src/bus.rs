//! # In-Process Message Bus
//!
//! This module defines [`MessageBus`], an ordered, synchronous publish/subscribe hub.
//!
//! ## Delivery Model
//!
//! * **Synchronous**: `publish` returns only after every subscriber has run.
//! * **Ordered**: subscribers of a topic are invoked in the order they subscribed.
//! * **Isolated**: a handler returning `Err` or panicking is logged and skipped
//!   over; the remaining subscribers still receive the payload.
//! * **Re-entrant**: the subscriber table is snapshotted before handlers run, so a
//!   handler may publish, subscribe or unsubscribe without deadlocking.

use crate::error::BusError;
use crate::message::{Payload, PublishOptions};
use crate::subscription::{Subscriber, SubscriptionHandle};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace, warn};

#[derive(Default)]
struct Registry {
    next_id: u64,
    topics: HashMap<String, Vec<Subscriber>>,
}

/// Cloneable handle to a shared subscriber table.
///
/// ```rust
/// use serde_json::json;
/// use std::sync::{Arc, Mutex};
/// use topic_bus::{MessageBus, PublishOptions};
///
/// let bus = MessageBus::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
///
/// let handle = bus.subscribe("PANEL/RELOAD", move |payload| {
///     sink.lock().unwrap().push(payload.clone());
///     Ok(())
/// });
///
/// bus.publish("RELOAD", &json!({ "page": 1 }), PublishOptions::scoped("PANEL/"));
/// bus.publish("RELOAD", &json!({ "page": 2 }), PublishOptions::global());
///
/// assert_eq!(seen.lock().unwrap().len(), 1);
/// assert!(bus.unsubscribe(&handle));
/// ```
#[derive(Clone, Default)]
pub struct MessageBus {
    inner: Arc<Mutex<Registry>>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        // Handlers never run under the lock, so a poisoned table is still consistent.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `handler` for the fully scoped `topic`.
    pub fn subscribe<F>(&self, topic: impl Into<String>, handler: F) -> SubscriptionHandle
    where
        F: Fn(&Payload) -> Result<(), BusError> + Send + Sync + 'static,
    {
        let topic = topic.into();
        let mut registry = self.registry();
        registry.next_id += 1;
        let id = registry.next_id;
        registry
            .topics
            .entry(topic.clone())
            .or_default()
            .push(Subscriber {
                id,
                handler: Arc::new(handler),
            });
        trace!(%topic, id, "Subscribed");
        SubscriptionHandle::new(id, topic)
    }

    /// Removes exactly the subscriber behind `handle`.
    ///
    /// Returns `false` when it was already gone.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) -> bool {
        let mut registry = self.registry();
        let Some(subscribers) = registry.topics.get_mut(handle.topic()) else {
            return false;
        };
        let before = subscribers.len();
        subscribers.retain(|s| s.id != handle.id());
        let removed = subscribers.len() != before;
        if subscribers.is_empty() {
            registry.topics.remove(handle.topic());
        }
        trace!(topic = handle.topic(), id = handle.id(), removed, "Unsubscribed");
        removed
    }

    /// Delivers `payload` to every subscriber of the scoped topic.
    ///
    /// Returns how many handlers were invoked, failed ones included.
    pub fn publish(&self, topic: &str, payload: &Payload, options: PublishOptions) -> usize {
        let scoped_topic = options.scoped_topic(topic);
        let handlers: Vec<_> = match self.registry().topics.get(&scoped_topic) {
            Some(subscribers) => subscribers.iter().map(|s| s.handler.clone()).collect(),
            None => Vec::new(),
        };
        debug!(topic = %scoped_topic, subscribers = handlers.len(), "Publish");

        for handler in &handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(payload))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(topic = %scoped_topic, error = %e, "Subscriber failed"),
                Err(_) => warn!(topic = %scoped_topic, "Subscriber panicked"),
            }
        }
        handlers.len()
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.registry().topics.get(topic).map_or(0, Vec::len)
    }

    /// Number of topics with at least one live subscriber.
    pub fn topic_count(&self) -> usize {
        self.registry().topics.len()
    }
}
