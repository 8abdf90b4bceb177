//! # Mock Transports & Dispatchers
//!
//! | Helper | Use Case |
//! |--------|----------|
//! | [`create_mock_transport`] | Hold calls open and answer them in any order |
//! | [`MockTransport`] | Scripted answers, consumed in call order |
//! | [`create_mock_dispatcher`] | Inspect what the registry queues, without any transport |
//!
//! ```rust
//! use serde_json::json;
//! use trash_management::model::{CallDescriptor, QueryParameters};
//! use trash_management::transport::mock::MockTransport;
//! use trash_management::transport::Transport;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = MockTransport::new();
//!     mock.expect_call().return_ok(json!({ "items": [] }));
//!
//!     let call = CallDescriptor::get("api/better-trash-management/archivedItems", QueryParameters::default());
//!     let body = mock.execute(call).await.unwrap();
//!
//!     assert_eq!(body, json!({ "items": [] }));
//!     assert_eq!(mock.calls().len(), 1);
//!     mock.verify();
//! }
//! ```

use super::{DispatchClient, DispatchRequest, Transport, TransportError};
use crate::model::CallDescriptor;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use topic_bus::Payload;

/// How long the `expect_*` helpers wait before giving up.
pub const EXPECT_TIMEOUT: Duration = Duration::from_secs(2);

// =============================================================================
// CHANNEL TRANSPORT
// =============================================================================

/// A call waiting for the test to answer it.
pub struct PendingCall {
    pub descriptor: CallDescriptor,
    respond_to: oneshot::Sender<Result<Payload, TransportError>>,
}

impl PendingCall {
    pub fn respond(self, result: Result<Payload, TransportError>) {
        let _ = self.respond_to.send(result);
    }
}

/// Forwards every call to a channel the test owns.
pub struct ChannelTransport {
    sender: mpsc::Sender<PendingCall>,
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn execute(&self, call: CallDescriptor) -> Result<Payload, TransportError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(PendingCall {
                descriptor: call,
                respond_to,
            })
            .await
            .map_err(|_| TransportError::Request("mock transport closed".into()))?;
        response
            .await
            .map_err(|_| TransportError::Request("mock call dropped".into()))?
    }
}

/// Creates a transport whose calls stay open until the test answers them.
///
/// Dropping a [`PendingCall`] unanswered fails the call.
pub fn create_mock_transport(
    buffer_size: usize,
) -> (Arc<ChannelTransport>, mpsc::Receiver<PendingCall>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (Arc::new(ChannelTransport { sender }), receiver)
}

/// Waits for the next call to reach the transport.
pub async fn expect_call(receiver: &mut mpsc::Receiver<PendingCall>) -> Option<PendingCall> {
    tokio::time::timeout(EXPECT_TIMEOUT, receiver.recv())
        .await
        .ok()
        .flatten()
}

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// A transport answering from a queue of scripted results.
///
/// Calls without a matching expectation fail with [`TransportError::Request`].
#[derive(Clone, Default)]
pub struct MockTransport {
    expectations: Arc<Mutex<VecDeque<Result<Payload, TransportError>>>>,
    calls: Arc<Mutex<Vec<CallDescriptor>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_call(&self) -> CallExpectationBuilder {
        CallExpectationBuilder {
            expectations: self.expectations.clone(),
        }
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<CallDescriptor> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Panics if scripted results were left unused.
    pub fn verify(&self) {
        let remaining = self.expectations.lock().map(|e| e.len()).unwrap_or(0);
        if remaining > 0 {
            panic!("Not all expectations were met. {remaining} remaining");
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, call: CallDescriptor) -> Result<Payload, TransportError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        let next = self.expectations.lock().ok().and_then(|mut e| e.pop_front());
        next.unwrap_or_else(|| Err(TransportError::Request("unexpected call".into())))
    }
}

pub struct CallExpectationBuilder {
    expectations: Arc<Mutex<VecDeque<Result<Payload, TransportError>>>>,
}

impl CallExpectationBuilder {
    pub fn return_ok(self, body: Payload) {
        self.push(Ok(body));
    }

    pub fn return_err(self, error: TransportError) {
        self.push(Err(error));
    }

    fn push(self, result: Result<Payload, TransportError>) {
        if let Ok(mut expectations) = self.expectations.lock() {
            expectations.push_back(result);
        }
    }
}

// =============================================================================
// DISPATCHER HELPERS
// =============================================================================

/// A dispatch client whose requests land on a receiver the test owns.
pub fn create_mock_dispatcher(
    buffer_size: usize,
) -> (DispatchClient, mpsc::Receiver<DispatchRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (DispatchClient::new(sender), receiver)
}

/// Returns the next queued dispatch, if one arrives in time.
pub async fn expect_dispatch(
    receiver: &mut mpsc::Receiver<DispatchRequest>,
) -> Option<DispatchRequest> {
    tokio::time::timeout(EXPECT_TIMEOUT, receiver.recv())
        .await
        .ok()
        .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QueryParameters;
    use serde_json::json;

    fn call(endpoint: &str) -> CallDescriptor {
        CallDescriptor::get(endpoint, QueryParameters::default())
    }

    #[tokio::test]
    async fn test_mock_transport_answers_in_script_order() {
        let mock = MockTransport::new();
        mock.expect_call().return_ok(json!(1));
        mock.expect_call().return_err(TransportError::Request("down".into()));

        assert_eq!(mock.execute(call("a")).await, Ok(json!(1)));
        assert_eq!(
            mock.execute(call("b")).await,
            Err(TransportError::Request("down".into()))
        );
        assert!(mock.execute(call("c")).await.is_err());
        assert_eq!(mock.calls().len(), 3);
        mock.verify();
    }

    #[tokio::test]
    async fn test_dropped_pending_call_fails() {
        let (transport, mut calls) = create_mock_transport(1);
        let task = tokio::spawn(async move { transport.execute(call("x")).await });

        drop(expect_call(&mut calls).await.unwrap());
        assert!(matches!(task.await.unwrap(), Err(TransportError::Request(_))));
    }
}
