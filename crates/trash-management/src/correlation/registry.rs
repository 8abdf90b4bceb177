use super::routing::{CallOutcome, Destination, Outcome, FAILURE_SUFFIX, SUCCESS_SUFFIX};
use crate::model::CallDescriptor;
use crate::transport::DispatchClient;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use topic_bus::{MessageBus, SubscriptionHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Binds one issued call to its eventual outcome.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationToken(String);

impl CorrelationToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The reply topic the dispatcher publishes a successful outcome on.
    pub fn success_topic(&self) -> String {
        format!("{}{SUCCESS_SUFFIX}", self.0)
    }

    pub fn failure_topic(&self) -> String {
        format!("{}{FAILURE_SUFFIX}", self.0)
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CorrelationToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl From<String> for CorrelationToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

/// An in-flight call: where each outcome goes and the two reply listeners.
#[derive(Debug)]
pub struct CorrelationEntry {
    pub token: CorrelationToken,
    pub success: Destination,
    pub failure: Destination,
    listeners: [SubscriptionHandle; 2],
}

pub type TokenGenerator = Arc<dyn Fn() -> CorrelationToken + Send + Sync>;

/// Tracks in-flight backend calls and routes each outcome exactly once.
///
/// Entries are keyed by their full token, so resolving `1` never touches the
/// listeners of `12`. Resolution removes the entry and both listeners before
/// anything is published; a second reply for the same token finds nothing.
#[derive(Clone)]
pub struct CorrelationRegistry {
    bus: MessageBus,
    dispatcher: DispatchClient,
    pending: Arc<Mutex<HashMap<CorrelationToken, CorrelationEntry>>>,
    next_token: TokenGenerator,
}

impl CorrelationRegistry {
    pub fn new(bus: MessageBus, dispatcher: DispatchClient) -> Self {
        Self {
            bus,
            dispatcher,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_token: Arc::new(CorrelationToken::generate),
        }
    }

    pub fn with_token_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn() -> CorrelationToken + Send + Sync + 'static,
    {
        let generator: TokenGenerator = Arc::new(generator);
        self.next_token = generator;
        self
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<CorrelationToken, CorrelationEntry>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers the reply listeners, then hands `descriptor` to the dispatcher.
    ///
    /// A generated token that is still pending is discarded and another one
    /// drawn. If the dispatcher cannot take the call it is resolved on the spot
    /// as a failure.
    pub fn issue_call(
        &self,
        descriptor: CallDescriptor,
        on_success: Destination,
        on_failure: Destination,
    ) -> CorrelationToken {
        let token = {
            let mut pending = self.pending();
            let mut token = (self.next_token)();
            while pending.contains_key(&token) {
                debug!(%token, "Token still pending, drawing another");
                token = (self.next_token)();
            }
            let listeners = [
                self.listen(&token, Outcome::Success),
                self.listen(&token, Outcome::Failure),
            ];
            pending.insert(
                token.clone(),
                CorrelationEntry {
                    token: token.clone(),
                    success: on_success,
                    failure: on_failure,
                    listeners,
                },
            );
            token
        };

        debug!(%token, method = %descriptor.method, endpoint = %descriptor.endpoint, "Call issued");
        if let Err(e) = self.dispatcher.dispatch(token.clone(), descriptor) {
            warn!(%token, error = %e, "Dispatch failed");
            self.resolve(&token, CallOutcome::Failure(e.to_payload()));
        }
        token
    }

    fn listen(&self, token: &CorrelationToken, outcome: Outcome) -> SubscriptionHandle {
        let registry = self.clone();
        let owner = token.clone();
        let topic = match outcome {
            Outcome::Success => token.success_topic(),
            Outcome::Failure => token.failure_topic(),
        };
        self.bus.subscribe(topic, move |payload| {
            let result = match outcome {
                Outcome::Success => CallOutcome::Success(payload.clone()),
                Outcome::Failure => CallOutcome::Failure(payload.clone()),
            };
            registry.resolve(&owner, result);
            Ok(())
        })
    }

    /// Publishes `outcome` to the destination recorded for `token`.
    ///
    /// Returns where it went, or `None` if the token was not pending (already
    /// resolved, or never issued).
    pub fn resolve(&self, token: &CorrelationToken, outcome: CallOutcome) -> Option<Destination> {
        let Some(entry) = self.pending().remove(token) else {
            debug!(%token, "Reply for a call that is not pending");
            return None;
        };
        for handle in &entry.listeners {
            self.bus.unsubscribe(handle);
        }

        let kind = outcome.kind();
        let destination = match kind {
            Outcome::Success => entry.success,
            Outcome::Failure => entry.failure,
        };
        info!(%token, topic = %destination.topic, scope = ?destination.scope, outcome = ?kind, "Call resolved");
        self.bus
            .publish(&destination.topic, outcome.payload(), destination.options());
        Some(destination)
    }

    pub fn pending_count(&self) -> usize {
        self.pending().len()
    }

    pub fn is_pending(&self, token: &CorrelationToken) -> bool {
        self.pending().contains_key(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QueryParameters;
    use crate::transport::mock::{create_mock_dispatcher, expect_dispatch};
    use serde_json::json;
    use std::collections::VecDeque;
    use topic_bus::mock::TopicWatcher;
    use topic_bus::PublishOptions;

    fn listing() -> CallDescriptor {
        CallDescriptor::get("api/better-trash-management/archivedItems", QueryParameters::default())
    }

    fn to(topic: &str) -> Destination {
        Destination {
            topic: topic.to_string(),
            scope: None,
        }
    }

    fn scripted(tokens: &[&str]) -> impl Fn() -> CorrelationToken + Send + Sync + 'static {
        let queue: Mutex<VecDeque<String>> =
            Mutex::new(tokens.iter().map(|t| t.to_string()).collect());
        move || {
            let next = queue.lock().unwrap().pop_front();
            CorrelationToken::from(next.unwrap_or_else(|| "exhausted".to_string()))
        }
    }

    #[tokio::test]
    async fn test_listeners_exist_before_dispatch() {
        let bus = MessageBus::new();
        let (client, mut dispatched) = create_mock_dispatcher(4);
        let registry = CorrelationRegistry::new(bus.clone(), client);

        let token = registry.issue_call(listing(), to("OK"), to("KO"));
        let request = expect_dispatch(&mut dispatched).await.unwrap();

        assert_eq!(request.token, token);
        assert_eq!(bus.subscriber_count(&token.success_topic()), 1);
        assert_eq!(bus.subscriber_count(&token.failure_topic()), 1);
        assert!(registry.is_pending(&token));
    }

    #[tokio::test]
    async fn test_resolves_exactly_once() {
        let bus = MessageBus::new();
        let (client, _dispatched) = create_mock_dispatcher(4);
        let registry = CorrelationRegistry::new(bus.clone(), client);
        let mut ok = TopicWatcher::attach(&bus, "OK");
        let mut ko = TopicWatcher::attach(&bus, "KO");

        let token = registry.issue_call(listing(), to("OK"), to("KO"));
        bus.publish(&token.success_topic(), &json!({ "n": 1 }), PublishOptions::global());
        bus.publish(&token.failure_topic(), &json!({ "n": 2 }), PublishOptions::global());
        bus.publish(&token.success_topic(), &json!({ "n": 3 }), PublishOptions::global());

        assert_eq!(ok.drain(), vec![json!({ "n": 1 })]);
        assert!(ko.drain().is_empty());
        assert_eq!(registry.pending_count(), 0);
        assert_eq!(bus.subscriber_count(&token.success_topic()), 0);
        assert_eq!(bus.subscriber_count(&token.failure_topic()), 0);
        assert!(registry.resolve(&token, CallOutcome::Failure(json!({}))).is_none());
    }

    #[tokio::test]
    async fn test_prefix_sharing_tokens_are_isolated() {
        let bus = MessageBus::new();
        let (client, _dispatched) = create_mock_dispatcher(4);
        let registry =
            CorrelationRegistry::new(bus.clone(), client).with_token_generator(scripted(&["1", "12"]));
        let mut first = TopicWatcher::attach(&bus, "FIRST_SUCCESS");

        let one = registry.issue_call(listing(), to("FIRST_SUCCESS"), to("FIRST_FAILURE"));
        let twelve = registry.issue_call(listing(), to("SECOND_SUCCESS"), to("SECOND_FAILURE"));
        assert_eq!((one.as_str(), twelve.as_str()), ("1", "12"));

        bus.publish("1_SUCCESS", &json!({}), PublishOptions::global());

        assert_eq!(first.drain().len(), 1);
        assert!(!registry.is_pending(&one));
        assert!(registry.is_pending(&twelve));
        assert_eq!(bus.subscriber_count("12_SUCCESS"), 1);
        assert_eq!(bus.subscriber_count("12_FAILURE"), 1);
    }

    #[tokio::test]
    async fn test_pending_token_is_never_handed_out_twice() {
        let bus = MessageBus::new();
        let (client, _dispatched) = create_mock_dispatcher(4);
        let registry = CorrelationRegistry::new(bus.clone(), client)
            .with_token_generator(scripted(&["dup", "dup", "fresh"]));

        let first = registry.issue_call(listing(), to("A"), to("B"));
        let second = registry.issue_call(listing(), to("A"), to("B"));

        assert_eq!(first.as_str(), "dup");
        assert_eq!(second.as_str(), "fresh");
        assert_eq!(bus.subscriber_count("dup_SUCCESS"), 1);
    }

    #[tokio::test]
    async fn test_dispatch_failure_resolves_immediately() {
        let bus = MessageBus::new();
        let (client, dispatched) = create_mock_dispatcher(1);
        drop(dispatched);
        let registry = CorrelationRegistry::new(bus.clone(), client);
        let mut ko = TopicWatcher::attach(&bus, "KO");

        let token = registry.issue_call(listing(), to("OK"), to("KO"));

        let payload = ko.try_next().expect("failure published synchronously");
        assert!(payload["message"].is_string());
        assert!(!registry.is_pending(&token));
        assert_eq!(bus.topic_count(), 1);
    }

    #[test]
    fn test_generated_tokens_are_unique() {
        let a = CorrelationToken::generate();
        let b = CorrelationToken::generate();
        assert_ne!(a, b);
        assert_eq!(a.success_topic(), format!("{a}_SUCCESS"));
    }
}
