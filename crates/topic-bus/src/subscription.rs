//! # Subscriptions
//!
//! A [`SubscriptionHandle`] is the only way to remove a subscriber again. Handles
//! are matched by identity, never by topic text, so releasing one subscriber can
//! not touch another that happens to share a topic prefix.

use crate::error::BusError;
use crate::message::Payload;
use std::sync::Arc;

/// Callback invoked for every payload published on a subscribed topic.
pub type Handler = Arc<dyn Fn(&Payload) -> Result<(), BusError> + Send + Sync>;

/// Identifies a single registered subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    id: u64,
    topic: String,
}

impl SubscriptionHandle {
    pub(crate) fn new(id: u64, topic: String) -> Self {
        Self { id, topic }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// The fully scoped topic this subscriber listens on.
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

pub(crate) struct Subscriber {
    pub(crate) id: u64,
    pub(crate) handler: Handler,
}
