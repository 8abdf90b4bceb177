//! # Correlation Registry
//!
//! Turns fire-and-forget publications into request/response pairs. Every
//! backend call gets a [`CorrelationToken`]; the registry listens on
//! `<token>_SUCCESS` and `<token>_FAILURE`, and when one of them fires it
//! forwards the payload to the destination the caller asked for.

pub mod registry;
pub mod routing;

pub use registry::*;
pub use routing::*;
