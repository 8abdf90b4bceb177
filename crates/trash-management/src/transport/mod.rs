//! # Backend Transport
//!
//! The correlation layer never performs I/O itself. It hands a
//! [`CallDescriptor`](crate::model::CallDescriptor) to the [`CallDispatcher`] actor,
//! which runs it on a [`Transport`] and publishes the outcome on the call's reply
//! topics.
//!
//! | Piece | Role |
//! |-------|------|
//! | [`Transport`] | Executes one call and returns the decoded JSON body |
//! | [`HttpTransport`] | `reqwest` implementation talking to the repository proxy |
//! | [`CallDispatcher`] / [`DispatchClient`] | Actor and client pair that run calls concurrently |
//! | [`mock`] | Channel-backed and expectation-based transports for tests |

pub mod dispatcher;
pub mod http;
pub mod mock;

pub use dispatcher::*;
pub use http::*;

use crate::model::CallDescriptor;
use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;
use topic_bus::Payload;

/// Failures reported by a [`Transport`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    /// The backend answered with a non-success status.
    #[error("Backend returned status {status}")]
    Status { status: u16, body: Payload },
    #[error("Request failed: {0}")]
    Request(String),
    #[error("Unreadable response: {0}")]
    Decode(String),
}

impl TransportError {
    /// What subscribers of the failure topic receive.
    ///
    /// Error bodies from the backend are forwarded untouched.
    pub fn to_payload(&self) -> Payload {
        match self {
            Self::Status { body, .. } => body.clone(),
            other => json!({ "message": other.to_string() }),
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, call: CallDescriptor) -> Result<Payload, TransportError>;
}
