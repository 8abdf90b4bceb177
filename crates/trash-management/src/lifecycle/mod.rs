//! # System Lifecycle
//!
//! Wires the bus, the call dispatcher actor and the service together, and takes
//! them down again in the right order.
//!
//! ```rust,ignore
//! let system = TrashSystem::start(config, Arc::new(HttpTransport::new(&config)?));
//! system.bus.publish("QUERY_ARCHIVED_ITEMS", &json!({ "page": 1 }), PublishOptions::global());
//! system.shutdown().await?;
//! ```
//!
//! ## Shutdown
//!
//! 1. **Unsubscribe** - the request topics stop being served
//! 2. **Drop the service** - the dispatcher's mailbox closes once the last
//!    pending call has resolved and released its listeners
//! 3. **Await the dispatcher** - it finishes the calls still in flight, so every
//!    issued call publishes exactly one outcome before shutdown returns
//!
//! Hold no clone of the service across `shutdown`; a live clone keeps the
//! dispatcher's mailbox open.
//!
//! ## Observability
//!
//! [`setup_tracing`] installs the compact `tracing` subscriber, filtered by
//! `RUST_LOG`:
//!
//! ```bash
//! RUST_LOG=info cargo run -p trash-management     # lifecycle and routing
//! RUST_LOG=debug cargo run -p trash-management    # payloads and calls
//! ```

pub mod trash_system;

pub use topic_bus::tracing::setup_tracing;
pub use trash_system::*;
