//! # Service Façade
//!
//! Subscribes to the request topics and turns each publication into a backend
//! call, an immediate failure, or a chain of follow-up publications.
//!
//! | Topic | Handling |
//! |-------|----------|
//! | `QUERY_ARCHIVED_ITEMS` | Always valid. Listing call via the correlation registry |
//! | `BROWSE_ARCHIVED_ITEMS` | Needs `nodeRef`; without it `{}` is published on the failure topic and no call is made |
//! | `DELETE_ARCHIVED_ITEMS` | One bulk call; nothing at all when no usable identifier was selected |
//! | `PUBLISH_CHAIN` | Handed to the chain publisher, no call |
//!
//! Every request is handled on its own: concurrent requests on the same topic get
//! separate tokens and resolve in whatever order their calls complete.
//!
//! The backend is reached through a [`DispatchClient`], so the façade itself
//! never performs I/O and can be driven synchronously from bus handlers.

pub mod error;
pub mod kind;

pub use error::*;
pub use kind::*;

use crate::chain::ChainPublisher;
use crate::config::ServiceConfig;
use crate::correlation::{
    resolve_destination, CorrelationRegistry, CorrelationToken, Destination, Outcome,
    FAILURE_SUFFIX,
};
use crate::model::{CallDescriptor, PublicationChain, RequestPayload};
use crate::query;
use crate::transport::DispatchClient;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use topic_bus::{
    empty_payload, BusError, MessageBus, Payload, PublishOptions, SubscriptionHandle,
};
use tracing::{debug, info, info_span, warn};

/// What the façade did with one request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    /// A backend call is in flight under this token.
    Issued(CorrelationToken),
    /// Invalid; the failure was published right away.
    Rejected(ServiceError),
    /// Nothing to do, nothing published.
    Skipped,
    /// Number of chained publications made.
    Chained(usize),
}

struct ServiceInner {
    bus: MessageBus,
    config: ServiceConfig,
    registry: CorrelationRegistry,
    chain: ChainPublisher,
    subscriptions: Mutex<Vec<SubscriptionHandle>>,
}

/// The archived-items service.
///
/// Cloning is cheap and every clone drives the same subscriptions and registry.
#[derive(Clone)]
pub struct TrashManagementService {
    inner: Arc<ServiceInner>,
}

impl TrashManagementService {
    pub fn new(bus: MessageBus, config: ServiceConfig, dispatcher: DispatchClient) -> Self {
        let registry = CorrelationRegistry::new(bus.clone(), dispatcher);
        Self::with_registry(bus, config, registry)
    }

    pub fn with_registry(bus: MessageBus, config: ServiceConfig, registry: CorrelationRegistry) -> Self {
        let chain = ChainPublisher::new(bus.clone(), config.scope().map(str::to_string));
        Self {
            inner: Arc::new(ServiceInner {
                bus,
                config,
                registry,
                chain,
                subscriptions: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn registry(&self) -> &CorrelationRegistry {
        &self.inner.registry
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    fn subscriptions(&self) -> MutexGuard<'_, Vec<SubscriptionHandle>> {
        self.inner
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribes to the four request topics under the configured prefix and scope.
    ///
    /// Calling it again while subscribed does nothing. Subscribers only hold a weak
    /// reference, so dropping every service clone silences them.
    pub fn register_subscriptions(&self) -> usize {
        let mut subscriptions = self.subscriptions();
        if !subscriptions.is_empty() {
            return subscriptions.len();
        }
        let options = PublishOptions::with_scope(self.inner.config.scope().map(str::to_string));
        for kind in RequestKind::ALL {
            let topic = options.scoped_topic(&kind.topic(&self.inner.config.topic_prefix));
            let service: Weak<ServiceInner> = Arc::downgrade(&self.inner);
            let handle = self.inner.bus.subscribe(topic.clone(), move |payload| {
                let inner = service
                    .upgrade()
                    .ok_or_else(|| BusError::Rejected("service stopped".to_string()))?;
                TrashManagementService { inner }.handle(kind, payload);
                Ok(())
            });
            info!(%topic, "Listening");
            subscriptions.push(handle);
        }
        subscriptions.len()
    }

    /// Releases the request subscriptions. Calls already issued still resolve.
    pub fn unregister_subscriptions(&self) -> usize {
        let handles: Vec<_> = self.subscriptions().drain(..).collect();
        for handle in &handles {
            self.inner.bus.unsubscribe(handle);
        }
        info!(released = handles.len(), "Stopped listening");
        handles.len()
    }

    pub fn handle(&self, kind: RequestKind, payload: &Payload) -> RequestOutcome {
        let span = info_span!("request", kind = kind.base_topic());
        let _entered = span.enter();
        debug!(?payload, "Request received");

        match kind {
            RequestKind::Query => self.query(payload),
            RequestKind::Browse => self.browse(payload),
            RequestKind::Delete => self.delete(payload),
            RequestKind::PublishChain => self.publish_chain(payload),
        }
    }

    pub fn query(&self, payload: &Payload) -> RequestOutcome {
        let request = RequestPayload::from_payload(payload);
        let call = query::build_list_query(&request, &self.inner.config.default_store);
        self.issue(RequestKind::Query, &request, call)
    }

    pub fn browse(&self, payload: &Payload) -> RequestOutcome {
        let request = RequestPayload::from_payload(payload);
        match query::build_browse_query(&request) {
            Ok(call) => self.issue(RequestKind::Browse, &request, call),
            Err(e) => {
                let destination = self.browse_failure(&request);
                warn!(topic = %destination.topic, error = %e, "Browse rejected");
                self.inner
                    .bus
                    .publish(&destination.topic, &empty_payload(), destination.options());
                RequestOutcome::Rejected(e)
            }
        }
    }

    pub fn delete(&self, payload: &Payload) -> RequestOutcome {
        let request = RequestPayload::from_payload(payload);
        match query::build_bulk_delete(&request) {
            Ok(call) => self.issue(RequestKind::Delete, &request, call),
            Err(e) => {
                debug!(error = %e, "Nothing to delete");
                RequestOutcome::Skipped
            }
        }
    }

    pub fn publish_chain(&self, payload: &Payload) -> RequestOutcome {
        let request = RequestPayload::from_payload(payload);
        let chain = PublicationChain::from_payload(payload);
        let published = self.inner.chain.run_chain(&chain, request.routing.response_scope());
        debug!(entries = chain.len(), published, "Chain published");
        RequestOutcome::Chained(published)
    }

    fn issue(&self, kind: RequestKind, request: &RequestPayload, call: CallDescriptor) -> RequestOutcome {
        let request_topic = kind.topic(&self.inner.config.topic_prefix);
        let own_scope = self.inner.config.scope();
        let on_success = resolve_destination(&request.routing, &request_topic, Outcome::Success, own_scope);
        let on_failure = resolve_destination(&request.routing, &request_topic, Outcome::Failure, own_scope);
        let token = self.inner.registry.issue_call(call, on_success, on_failure);
        info!(%token, "Request dispatched");
        RequestOutcome::Issued(token)
    }

    /// `<responseTopic or request topic>_FAILURE`, in the response scope when one
    /// was given and the service's own scope otherwise.
    fn browse_failure(&self, request: &RequestPayload) -> Destination {
        let request_topic = RequestKind::Browse.topic(&self.inner.config.topic_prefix);
        let topic = format!(
            "{}{FAILURE_SUFFIX}",
            request.routing.response_topic().unwrap_or(&request_topic)
        );
        Destination::scoped(topic, request.routing.response_scope().or(self.inner.config.scope()))
    }
}
