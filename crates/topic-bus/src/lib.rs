//! # Topic Bus
//!
//! An ordered, synchronous, in-process publish/subscribe bus with topic strings and
//! optional scope prefixes.
//!
//! ## Why a Bus?
//!
//! Components that talk over topics never hold references to each other. A widget
//! publishes `QUERY_ARCHIVED_ITEMS`; whoever serves that topic answers on
//! `QUERY_ARCHIVED_ITEMS_SUCCESS`. Swapping the service, adding a second listener or
//! replaying traffic in a test needs no wiring changes.
//!
//! ### Scopes
//!
//! A scope is a string prefix. Two copies of the same panel subscribe to
//! `"LEFT/RELOAD"` and `"RIGHT/RELOAD"`; a reply published with
//! `PublishOptions::scoped("LEFT/")` reaches only the left one.
//!
//! ## Architecture Overview
//!
//! 1. **Messages** ([`Payload`], [`PublishOptions`]) - what is sent and where it lands
//! 2. **Registry** ([`MessageBus`]) - the subscriber table and delivery loop
//! 3. **Handles** ([`SubscriptionHandle`]) - identity-based removal of subscribers
//!
//! ## Concurrency Model
//!
//! - `publish` runs every handler before it returns, in subscription order
//! - The subscriber table is only locked while it is read or changed, never while
//!   handlers run, so handlers may publish again
//! - The bus is `Clone + Send + Sync`; background tasks publish through their own clone
//!
//! ## Testing
//!
//! See the [`mock`] module for [`TopicWatcher`](mock::TopicWatcher) and
//! [`PublicationLog`](mock::PublicationLog).

pub mod bus;
pub mod error;
pub mod message;
pub mod mock;
pub mod subscription;
pub mod tracing;

// Re-export core types for convenience
pub use bus::MessageBus;
pub use error::BusError;
pub use message::{empty_payload, Payload, PublishOptions};
pub use subscription::{Handler, SubscriptionHandle};
