//! # Call Dispatcher
//!
//! Actor that owns the [`Transport`] and runs backend calls. Requests arrive on
//! a bounded mailbox; every call runs in its own task so a slow listing never
//! holds up a delete. The outcome is published globally on the call's reply
//! topics, `<token>_SUCCESS` or `<token>_FAILURE`, where the correlation registry
//! is listening.
//!
//! The actor stops once every [`DispatchClient`] is dropped and the calls already
//! in flight have published their outcome.

use super::Transport;
use crate::correlation::CorrelationToken;
use crate::model::CallDescriptor;
use crate::service::ServiceError;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinSet;
use topic_bus::{MessageBus, PublishOptions};
use tracing::{debug, info, warn};

/// One call handed to the dispatcher.
#[derive(Debug)]
pub struct DispatchRequest {
    pub token: CorrelationToken,
    pub descriptor: CallDescriptor,
}

/// Cheap, cloneable handle for queueing calls on a [`CallDispatcher`].
#[derive(Clone)]
pub struct DispatchClient {
    sender: mpsc::Sender<DispatchRequest>,
}

impl DispatchClient {
    pub fn new(sender: mpsc::Sender<DispatchRequest>) -> Self {
        Self { sender }
    }

    /// Queues a call without waiting.
    ///
    /// Bus handlers run synchronously, so a full mailbox is reported instead of
    /// awaited.
    pub fn dispatch(
        &self,
        token: CorrelationToken,
        descriptor: CallDescriptor,
    ) -> Result<(), ServiceError> {
        self.sender
            .try_send(DispatchRequest { token, descriptor })
            .map_err(|e| match e {
                TrySendError::Full(_) => ServiceError::DispatcherBusy,
                TrySendError::Closed(_) => ServiceError::DispatcherClosed,
            })
    }
}

pub struct CallDispatcher {
    receiver: mpsc::Receiver<DispatchRequest>,
    transport: Arc<dyn Transport>,
    bus: MessageBus,
}

impl CallDispatcher {
    /// Creates the actor and its client. Run the actor with [`CallDispatcher::run`].
    pub fn new(
        buffer_size: usize,
        transport: Arc<dyn Transport>,
        bus: MessageBus,
    ) -> (Self, DispatchClient) {
        let (sender, receiver) = mpsc::channel(buffer_size.max(1));
        let dispatcher = Self {
            receiver,
            transport,
            bus,
        };
        (dispatcher, DispatchClient::new(sender))
    }

    pub async fn run(mut self) {
        info!("Dispatcher started");
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                request = self.receiver.recv() => {
                    let Some(request) = request else { break };
                    debug!(token = %request.token, endpoint = %request.descriptor.endpoint, "Dispatch");
                    in_flight.spawn(execute(self.transport.clone(), self.bus.clone(), request));
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        warn!(error = %e, "Call task aborted");
                    }
                }
            }
        }

        let remaining = in_flight.len();
        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Call task aborted");
            }
        }
        info!(drained = remaining, "Dispatcher stopped");
    }
}

async fn execute(transport: Arc<dyn Transport>, bus: MessageBus, request: DispatchRequest) {
    let DispatchRequest { token, descriptor } = request;
    let endpoint = descriptor.endpoint.clone();
    match transport.execute(descriptor).await {
        Ok(body) => {
            debug!(%token, %endpoint, "Call succeeded");
            bus.publish(&token.success_topic(), &body, PublishOptions::global());
        }
        Err(e) => {
            warn!(%token, %endpoint, error = %e, "Call failed");
            bus.publish(&token.failure_topic(), &e.to_payload(), PublishOptions::global());
        }
    }
}
