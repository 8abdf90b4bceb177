use crate::transport::TransportError;
use serde_json::json;
use thiserror::Error;
use topic_bus::Payload;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("No archived items selected")]
    EmptySet,
    #[error("Call dispatcher is not running")]
    DispatcherClosed,
    #[error("Call dispatcher is at capacity")]
    DispatcherBusy,
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Shutdown failed: {0}")]
    Shutdown(String),
}

impl ServiceError {
    /// Failure payload for callers; backend bodies are forwarded unchanged.
    pub fn to_payload(&self) -> Payload {
        match self {
            Self::Transport(e) => e.to_payload(),
            other => json!({ "message": other.to_string() }),
        }
    }
}
