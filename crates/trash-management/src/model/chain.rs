use serde_json::{Map, Value};
use topic_bus::{empty_payload, Payload, PublishOptions};

/// Key added to every chained payload so nested requests can reply in scope.
pub const RESPONSE_SCOPE_KEY: &str = "responseScope";

/// One follow-up publication of a [`PublicationChain`].
#[derive(Debug, Clone, PartialEq)]
pub struct PublicationEntry {
    /// Every topic receives its own publication of the same payload.
    pub topics: Vec<String>,
    pub payload: Option<Map<String, Value>>,
    pub scope: Option<String>,
    pub global: bool,
}

impl PublicationEntry {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topics: vec![topic.into()],
            payload: None,
            scope: None,
            global: true,
        }
    }

    pub fn with_payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Reads `publishTopic` (string or list), `publishPayload`, `publishScope`
    /// and `publishGlobal` (default `true`).
    pub fn from_value(value: &Value) -> Self {
        let topics = match value.get("publishTopic") {
            Some(Value::String(topic)) if !topic.is_empty() => vec![topic.clone()],
            Some(Value::Array(topics)) => topics
                .iter()
                .filter_map(Value::as_str)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };
        Self {
            topics,
            payload: value.get("publishPayload").and_then(Value::as_object).cloned(),
            scope: value
                .get("publishScope")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            global: value
                .get("publishGlobal")
                .and_then(Value::as_bool)
                .unwrap_or(true),
        }
    }

    /// Copies the payload field by field and stamps it with `response_scope`.
    ///
    /// Without a payload the entry publishes `{}` as is.
    pub fn prepare_payload(&self, response_scope: Option<&str>) -> Payload {
        let Some(fields) = &self.payload else {
            return empty_payload();
        };
        let mut copy = Map::with_capacity(fields.len() + 1);
        for (key, value) in fields {
            copy.insert(key.clone(), value.clone());
        }
        match response_scope {
            Some(scope) => {
                copy.insert(RESPONSE_SCOPE_KEY.to_string(), Value::String(scope.to_string()));
            }
            None => {
                copy.remove(RESPONSE_SCOPE_KEY);
            }
        }
        Value::Object(copy)
    }

    /// An explicit scope wins; otherwise global entries go out unscoped and the
    /// rest use the publisher's own scope.
    pub fn publish_options(&self, own_scope: Option<&str>) -> PublishOptions {
        match (&self.scope, self.global) {
            (Some(scope), _) => PublishOptions::scoped(scope.clone()),
            (None, true) => PublishOptions::global(),
            (None, false) => PublishOptions::with_scope(own_scope.map(str::to_string)),
        }
    }
}

/// Ordered follow-up publications carried by a `PUBLISH_CHAIN` request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublicationChain {
    pub entries: Vec<PublicationEntry>,
}

impl PublicationChain {
    /// A missing or non-array `publications` field is an empty chain.
    pub fn from_payload(payload: &Payload) -> Self {
        let entries = payload
            .get("publications")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(PublicationEntry::from_value).collect())
            .unwrap_or_default();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_single_and_multiple_topics() {
        let chain = PublicationChain::from_payload(&json!({
            "publications": [
                { "publishTopic": ["DISABLE-TAB", "SELECT-TAB"], "publishPayload": { "index": 1 } },
                { "publishTopic": "TREE/SET_PARENT", "publishScope": "TREE/", "publishGlobal": false },
                { "publishPayload": { "orphan": true } }
            ]
        }));

        assert_eq!(chain.len(), 3);
        assert_eq!(chain.entries[0].topics, vec!["DISABLE-TAB", "SELECT-TAB"]);
        assert!(chain.entries[0].global);
        assert_eq!(chain.entries[1].scope.as_deref(), Some("TREE/"));
        assert!(!chain.entries[1].global);
        assert!(chain.entries[2].topics.is_empty());
    }

    #[test]
    fn test_missing_publications_is_empty_chain() {
        assert!(PublicationChain::from_payload(&json!({})).is_empty());
        assert!(PublicationChain::from_payload(&json!({ "publications": "x" })).is_empty());
    }

    #[test]
    fn test_prepare_payload_stamps_scope_on_a_copy() {
        let entry = PublicationEntry::from_value(&json!({
            "publishTopic": "T",
            "publishPayload": { "nested": { "a": 1 }, "responseScope": "OLD/" }
        }));

        let stamped = entry.prepare_payload(Some("NEW/"));
        assert_eq!(stamped, json!({ "nested": { "a": 1 }, "responseScope": "NEW/" }));

        let unscoped = entry.prepare_payload(None);
        assert_eq!(unscoped, json!({ "nested": { "a": 1 } }));

        // The entry itself is untouched.
        assert_eq!(entry.payload.unwrap()["responseScope"], json!("OLD/"));
    }

    #[test]
    fn test_absent_payload_publishes_empty_object() {
        let entry = PublicationEntry::new("T");
        assert_eq!(entry.prepare_payload(Some("S/")), json!({}));
    }

    #[test]
    fn test_publish_options() {
        let mut entry = PublicationEntry::new("T");
        assert_eq!(entry.publish_options(Some("OWN/")), PublishOptions::global());

        entry.global = false;
        assert_eq!(entry.publish_options(Some("OWN/")), PublishOptions::scoped("OWN/"));
        assert_eq!(entry.publish_options(None), PublishOptions::global());

        entry.scope = Some("X/".into());
        assert_eq!(entry.publish_options(Some("OWN/")), PublishOptions::scoped("X/"));
    }
}
