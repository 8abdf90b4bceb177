use crate::model::ResponseRouting;
use topic_bus::{Payload, PublishOptions};

pub const SUCCESS_SUFFIX: &str = "_SUCCESS";
pub const FAILURE_SUFFIX: &str = "_FAILURE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Success => SUCCESS_SUFFIX,
            Self::Failure => FAILURE_SUFFIX,
        }
    }
}

/// What came back for a correlated call.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    Success(Payload),
    Failure(Payload),
}

impl CallOutcome {
    pub fn kind(&self) -> Outcome {
        match self {
            Self::Success(_) => Outcome::Success,
            Self::Failure(_) => Outcome::Failure,
        }
    }

    pub fn payload(&self) -> &Payload {
        match self {
            Self::Success(payload) | Self::Failure(payload) => payload,
        }
    }
}

/// A topic plus the scope it is published under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub topic: String,
    pub scope: Option<String>,
}

impl Destination {
    /// Drops `scope` when `topic` already carries it.
    pub fn scoped(topic: String, scope: Option<&str>) -> Self {
        let scope = scope
            .filter(|scope| !topic.starts_with(scope))
            .map(str::to_string);
        Self { topic, scope }
    }

    pub fn options(&self) -> PublishOptions {
        PublishOptions::with_scope(self.scope.clone())
    }
}

/// Picks the topic the caller wants an outcome delivered to.
///
/// An explicit `successTopic`/`failureTopic` wins, then the legacy implicit one,
/// then `<responseTopic>_SUCCESS`/`_FAILURE` (falling back to `default_topic`).
/// The response scope, or `own_scope` when the caller gave none, is applied
/// unless the topic already starts with it.
pub fn resolve_destination(
    routing: &ResponseRouting,
    default_topic: &str,
    outcome: Outcome,
    own_scope: Option<&str>,
) -> Destination {
    let (explicit, legacy) = match outcome {
        Outcome::Success => (routing.success_topic.as_deref(), routing.legacy_success()),
        Outcome::Failure => (routing.failure_topic.as_deref(), routing.legacy_failure()),
    };
    let topic = match explicit.or(legacy) {
        Some(topic) => topic.to_string(),
        None => format!(
            "{}{}",
            routing.response_topic().unwrap_or(default_topic),
            outcome.suffix()
        ),
    };
    Destination::scoped(topic, routing.response_scope().or(own_scope))
}
