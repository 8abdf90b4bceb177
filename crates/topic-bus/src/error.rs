//! # Bus Errors
//!
//! Errors a subscriber can report back to the bus. The bus never propagates them
//! to the publisher: a failing handler is logged and delivery carries on with the
//! next subscriber.

/// Errors raised by subscription handlers.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Handler rejected payload: {0}")]
    Rejected(String),
    #[error("Malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
}
