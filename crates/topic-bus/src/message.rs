//! # Payloads & Publish Options
//!
//! Every publication carries a JSON [`Payload`]. Where it lands is decided by the
//! topic plus the optional scope in [`PublishOptions`].

use serde_json::{Map, Value};

/// The body of every publication on the bus.
pub type Payload = Value;

/// Returns `{}`, the payload used when a publisher has nothing to say.
pub fn empty_payload() -> Payload {
    Value::Object(Map::new())
}

/// Controls how a topic is turned into the key subscribers listen on.
///
/// A scope is a plain string prefix. Widgets that exist more than once on a page
/// subscribe to `"<scope><topic>"` so their traffic never crosses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishOptions {
    scope: Option<String>,
}

impl PublishOptions {
    /// Publish on the bare topic.
    pub fn global() -> Self {
        Self { scope: None }
    }

    /// Publish on `scope + topic`.
    pub fn scoped(scope: impl Into<String>) -> Self {
        Self::with_scope(Some(scope.into()))
    }

    /// Empty scopes are treated like no scope at all.
    pub fn with_scope(scope: Option<String>) -> Self {
        Self {
            scope: scope.filter(|s| !s.is_empty()),
        }
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// The key a publication with these options is delivered to.
    pub fn scoped_topic(&self, topic: &str) -> String {
        match &self.scope {
            Some(scope) => format!("{scope}{topic}"),
            None => topic.to_string(),
        }
    }
}
