//! # Test Watchers
//!
//! Helpers for asserting what was published on a [`MessageBus`] without writing a
//! handler per test.
//!
//! | Helper | Use Case |
//! |--------|----------|
//! | [`TopicWatcher`] | Wait for (or assert the absence of) payloads on one topic |
//! | [`PublicationLog`] | Check the relative order of publications across several topics |
//!
//! ```rust
//! use serde_json::json;
//! use topic_bus::mock::TopicWatcher;
//! use topic_bus::{MessageBus, PublishOptions};
//!
//! #[tokio::main]
//! async fn main() {
//!     let bus = MessageBus::new();
//!     let mut watcher = TopicWatcher::attach(&bus, "RELOAD");
//!
//!     bus.publish("RELOAD", &json!({ "page": 3 }), PublishOptions::global());
//!
//!     let payload = watcher.next().await.expect("publication");
//!     assert_eq!(payload["page"], 3);
//!     assert!(watcher.try_next().is_none());
//! }
//! ```

use crate::bus::MessageBus;
use crate::message::Payload;
use crate::subscription::SubscriptionHandle;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// How long [`TopicWatcher::next`] waits before giving up.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(2);

/// Buffers every payload published on a single topic.
///
/// The subscription is released when the watcher is dropped.
pub struct TopicWatcher {
    bus: MessageBus,
    handle: SubscriptionHandle,
    receiver: mpsc::UnboundedReceiver<Payload>,
}

impl TopicWatcher {
    /// Subscribes to the fully scoped `topic`.
    pub fn attach(bus: &MessageBus, topic: impl Into<String>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = bus.subscribe(topic, move |payload| {
            let _ = sender.send(payload.clone());
            Ok(())
        });
        Self {
            bus: bus.clone(),
            handle,
            receiver,
        }
    }

    pub fn topic(&self) -> &str {
        self.handle.topic()
    }

    /// Waits up to [`DEFAULT_WAIT`] for the next payload.
    pub async fn next(&mut self) -> Option<Payload> {
        self.next_within(DEFAULT_WAIT).await
    }

    pub async fn next_within(&mut self, wait: Duration) -> Option<Payload> {
        tokio::time::timeout(wait, self.receiver.recv())
            .await
            .ok()
            .flatten()
    }

    /// Returns an already buffered payload without waiting.
    pub fn try_next(&mut self) -> Option<Payload> {
        self.receiver.try_recv().ok()
    }

    pub fn drain(&mut self) -> Vec<Payload> {
        let mut payloads = Vec::new();
        while let Some(payload) = self.try_next() {
            payloads.push(payload);
        }
        payloads
    }
}

impl Drop for TopicWatcher {
    fn drop(&mut self) {
        self.bus.unsubscribe(&self.handle);
    }
}

/// Records `(topic, payload)` pairs from several topics in arrival order.
pub struct PublicationLog {
    bus: MessageBus,
    handles: Vec<SubscriptionHandle>,
    entries: Arc<Mutex<Vec<(String, Payload)>>>,
}

impl PublicationLog {
    pub fn attach<I, S>(bus: &MessageBus, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = Arc::new(Mutex::new(Vec::new()));
        let handles = topics
            .into_iter()
            .map(|topic| {
                let topic = topic.into();
                let sink = entries.clone();
                let label = topic.clone();
                bus.subscribe(topic, move |payload| {
                    if let Ok(mut log) = sink.lock() {
                        log.push((label.clone(), payload.clone()));
                    }
                    Ok(())
                })
            })
            .collect();
        Self {
            bus: bus.clone(),
            handles,
            entries,
        }
    }

    pub fn entries(&self) -> Vec<(String, Payload)> {
        self.entries.lock().map(|log| log.clone()).unwrap_or_default()
    }

    pub fn topics(&self) -> Vec<String> {
        self.entries().into_iter().map(|(topic, _)| topic).collect()
    }
}

impl Drop for PublicationLog {
    fn drop(&mut self) {
        for handle in &self.handles {
            self.bus.unsubscribe(handle);
        }
    }
}
