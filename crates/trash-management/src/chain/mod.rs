//! # Chain Publisher
//!
//! Re-publishes the follow-up publications of a `PUBLISH_CHAIN` request, strictly
//! in order. Each topic of each entry gets its own copy of the payload, stamped
//! with the incoming response scope. Nothing is rolled back: a subscriber that fails
//! or panics is the bus's problem and the chain carries on.

use crate::model::PublicationChain;
use topic_bus::MessageBus;
use tracing::debug;

#[derive(Clone)]
pub struct ChainPublisher {
    bus: MessageBus,
    own_scope: Option<String>,
}

impl ChainPublisher {
    /// `own_scope` is used by entries that are neither global nor explicitly scoped.
    pub fn new(bus: MessageBus, own_scope: Option<String>) -> Self {
        Self {
            bus,
            own_scope: own_scope.filter(|s| !s.is_empty()),
        }
    }

    /// Returns the number of publications made.
    pub fn run_chain(&self, chain: &PublicationChain, response_scope: Option<&str>) -> usize {
        let mut published = 0;
        for (index, entry) in chain.entries.iter().enumerate() {
            if entry.topics.is_empty() {
                debug!(index, "Chain entry without a topic, skipped");
                continue;
            }
            let options = entry.publish_options(self.own_scope.as_deref());
            for topic in &entry.topics {
                let payload = entry.prepare_payload(response_scope);
                debug!(index, %topic, scope = ?options.scope(), "Chained publication");
                self.bus.publish(topic, &payload, options.clone());
                published += 1;
            }
        }
        published
    }
}
