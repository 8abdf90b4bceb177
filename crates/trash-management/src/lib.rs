//! # Trash Management
//!
//! Serves the archived-items ("trash") requests of a content-management UI over
//! an in-process [`topic_bus`]. A widget publishes a request topic; the service
//! builds the backend call, runs it through the dispatcher, and publishes the
//! outcome on the topic the widget asked for, in the widget's scope.
//!
//! ## Components
//!
//! - **[model]**: request payloads, filters, call descriptors and publication chains
//! - **[query]**: pure builders turning a request into a [`CallDescriptor`](model::CallDescriptor)
//! - **[correlation]**: tokens, reply listeners and outcome routing
//! - **[chain]**: ordered follow-up publications for `PUBLISH_CHAIN`
//! - **[service]**: the façade subscribed to the request topics
//! - **[transport]**: the backend seam, the HTTP client and the dispatcher actor
//! - **[lifecycle]**: start-up and orderly shutdown
//!
//! ## Routing at a Glance
//!
//! ```rust
//! use serde_json::json;
//! use trash_management::correlation::{resolve_destination, Outcome};
//! use trash_management::model::RequestPayload;
//!
//! let request = RequestPayload::from_payload(&json!({
//!     "responseTopic": "ARCHIVE_LIST",
//!     "responseScope": "PANEL_1/"
//! }));
//! let reply = resolve_destination(&request.routing, "QUERY_ARCHIVED_ITEMS", Outcome::Success, None);
//!
//! assert_eq!(reply.topic, "ARCHIVE_LIST_SUCCESS");
//! assert_eq!(reply.scope.as_deref(), Some("PANEL_1/"));
//! ```
//!
//! ## Testing
//!
//! See [`transport::mock`] for scripted and channel-backed transports, and
//! [`topic_bus::mock`] for watchers that capture publications.

pub mod chain;
pub mod config;
pub mod correlation;
pub mod lifecycle;
pub mod model;
pub mod query;
pub mod service;
pub mod transport;
