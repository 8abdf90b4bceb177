use serde::Deserialize;
use serde_json::Value;
use topic_bus::Payload;
use tracing::warn;

use super::filter::DataFilter;
use super::lenient;

/// Everything a widget may put into a request publication.
///
/// Parsing never fails: fields with unusable values are simply absent, and a
/// payload that is not an object behaves like `{}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPayload {
    #[serde(default, deserialize_with = "lenient::non_empty_string")]
    pub node_ref: Option<String>,
    /// 1-based.
    #[serde(default, deserialize_with = "lenient::positive_int")]
    pub page: Option<u64>,
    #[serde(default, deserialize_with = "lenient::positive_int")]
    pub page_size: Option<u64>,
    #[serde(default, rename = "dataFilters", deserialize_with = "lenient::array")]
    raw_filters: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "lenient::non_empty_string")]
    pub default_operator: Option<String>,
    #[serde(default, deserialize_with = "lenient::non_empty_string")]
    pub default_query_template: Option<String>,
    #[serde(default, rename = "nodes", deserialize_with = "lenient::array")]
    raw_nodes: Option<Vec<Value>>,
    #[serde(default, rename = "selectedItems", deserialize_with = "lenient::array")]
    raw_selected_items: Option<Vec<Value>>,
    #[serde(flatten)]
    pub routing: ResponseRouting,
}

impl RequestPayload {
    pub fn from_payload(payload: &Payload) -> Self {
        if !payload.is_object() {
            return Self::default();
        }
        serde_json::from_value(payload.clone()).unwrap_or_else(|e| {
            warn!(error = %e, "Unreadable request payload, treating as empty");
            Self::default()
        })
    }

    /// Filters in publication order; malformed entries are skipped.
    pub fn data_filters(&self) -> Vec<DataFilter> {
        self.raw_filters
            .iter()
            .flatten()
            .filter_map(DataFilter::from_value)
            .collect()
    }

    pub fn with_filters<I>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = DataFilter>,
    {
        let entries = filters
            .into_iter()
            .map(|f| serde_json::json!({ "name": f.name, "value": f.value }));
        self.raw_filters = Some(entries.collect());
        self
    }

    /// `selectedItems` when it is an array, otherwise `nodes`.
    pub fn selection(&self) -> Vec<SelectedItem> {
        self.raw_selected_items
            .as_ref()
            .or(self.raw_nodes.as_ref())
            .map(|items| items.iter().map(SelectedItem::from_value).collect())
            .unwrap_or_default()
    }
}

/// One entry of `selectedItems` / `nodes`.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectedItem {
    /// A bare identifier string.
    Reference(String),
    /// A record with a string `nodeRef` field.
    Record(String),
    /// Anything else.
    Other(Value),
}

impl SelectedItem {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::Reference(s.clone()),
            Value::Object(fields) => match fields.get("nodeRef") {
                Some(Value::String(node_ref)) => Self::Record(node_ref.clone()),
                _ => Self::Other(value.clone()),
            },
            other => Self::Other(other.clone()),
        }
    }

    /// The identifier this entry contributes to a bulk call, if any.
    ///
    /// Bare strings must look like `<protocol>://<identifier>/<id>`; records only
    /// need a non-empty `nodeRef`.
    pub fn node_ref(&self) -> Option<&str> {
        match self {
            Self::Reference(s) if is_node_reference(s) => Some(s),
            Self::Record(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }
}

/// `<protocol>://<identifier>/<id>` with a colon-free protocol and a slash-free
/// store identifier.
pub fn is_node_reference(candidate: &str) -> bool {
    let Some((protocol, rest)) = candidate.split_once("://") else {
        return false;
    };
    if protocol.is_empty() || protocol.contains(':') {
        return false;
    }
    match rest.split_once('/') {
        Some((store, id)) => !store.is_empty() && !id.is_empty(),
        None => false,
    }
}

/// Where the caller wants the reply to go.
///
/// Explicit destinations (`successTopic` / `failureTopic`) win over the legacy
/// implicit ones, which win over `<responseTopic>_SUCCESS` / `_FAILURE`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRouting {
    #[serde(default, deserialize_with = "lenient::non_empty_string")]
    pub success_topic: Option<String>,
    #[serde(default, deserialize_with = "lenient::non_empty_string")]
    pub failure_topic: Option<String>,
    /// Spelled `alfSucessTopic` by the publishers that predate the fix.
    #[serde(default, rename = "alfSucessTopic", deserialize_with = "lenient::non_empty_string")]
    pub legacy_success_topic: Option<String>,
    #[serde(default, rename = "alfSuccessTopic", deserialize_with = "lenient::non_empty_string")]
    pub alf_success_topic: Option<String>,
    #[serde(default, rename = "alfFailureTopic", deserialize_with = "lenient::non_empty_string")]
    pub legacy_failure_topic: Option<String>,
    #[serde(default, deserialize_with = "lenient::non_empty_string")]
    pub response_topic: Option<String>,
    #[serde(default, rename = "alfResponseTopic", deserialize_with = "lenient::non_empty_string")]
    pub alf_response_topic: Option<String>,
    #[serde(default, deserialize_with = "lenient::non_empty_string")]
    pub response_scope: Option<String>,
    #[serde(default, rename = "alfResponseScope", deserialize_with = "lenient::non_empty_string")]
    pub alf_response_scope: Option<String>,
}

impl ResponseRouting {
    pub fn legacy_success(&self) -> Option<&str> {
        self.legacy_success_topic
            .as_deref()
            .or(self.alf_success_topic.as_deref())
    }

    pub fn legacy_failure(&self) -> Option<&str> {
        self.legacy_failure_topic.as_deref()
    }

    pub fn response_topic(&self) -> Option<&str> {
        self.response_topic
            .as_deref()
            .or(self.alf_response_topic.as_deref())
    }

    pub fn response_scope(&self) -> Option<&str> {
        self.response_scope
            .as_deref()
            .or(self.alf_response_scope.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_full_payload() {
        let request = RequestPayload::from_payload(&json!({
            "nodeRef": "archive://SpacesStore/abc",
            "page": "2",
            "pageSize": 20,
            "dataFilters": [{ "name": "name", "value": "report" }, "junk"],
            "defaultOperator": "AND",
            "alfResponseTopic": "LIST",
            "alfResponseScope": "PANEL/",
            "alfSucessTopic": "DONE"
        }));

        assert_eq!(request.node_ref.as_deref(), Some("archive://SpacesStore/abc"));
        assert_eq!(request.page, Some(2));
        assert_eq!(request.page_size, Some(20));
        assert_eq!(request.data_filters(), vec![DataFilter::new("name", "report")]);
        assert_eq!(request.default_operator.as_deref(), Some("AND"));
        assert_eq!(request.routing.response_topic(), Some("LIST"));
        assert_eq!(request.routing.response_scope(), Some("PANEL/"));
        assert_eq!(request.routing.legacy_success(), Some("DONE"));
    }

    #[test]
    fn test_bad_fields_are_absent_not_fatal() {
        let request = RequestPayload::from_payload(&json!({
            "page": 0,
            "pageSize": "lots",
            "dataFilters": "name=x",
            "nodes": 5,
            "responseTopic": "",
            "successTopic": 42
        }));

        assert_eq!(request.page, None);
        assert_eq!(request.page_size, None);
        assert!(request.data_filters().is_empty());
        assert!(request.selection().is_empty());
        assert_eq!(request.routing, ResponseRouting::default());
    }

    #[test]
    fn test_non_object_payload_is_empty() {
        assert_eq!(RequestPayload::from_payload(&json!(null)), RequestPayload::default());
        assert_eq!(RequestPayload::from_payload(&json!([1, 2])), RequestPayload::default());
    }

    #[test]
    fn test_explicit_response_fields_win_over_implicit() {
        let request = RequestPayload::from_payload(&json!({
            "responseTopic": "EXPLICIT",
            "alfResponseTopic": "IMPLICIT",
            "responseScope": "A/",
            "alfResponseScope": "B/"
        }));
        assert_eq!(request.routing.response_topic(), Some("EXPLICIT"));
        assert_eq!(request.routing.response_scope(), Some("A/"));
    }

    #[test]
    fn test_selected_items_take_precedence_over_nodes() {
        let request = RequestPayload::from_payload(&json!({
            "selectedItems": ["archive://SpacesStore/a"],
            "nodes": ["archive://SpacesStore/b"]
        }));
        assert_eq!(
            request.selection(),
            vec![SelectedItem::Reference("archive://SpacesStore/a".into())]
        );
    }

    #[test]
    fn test_selected_item_shapes() {
        assert_eq!(
            SelectedItem::from_value(&json!("store://a/b")).node_ref(),
            Some("store://a/b")
        );
        assert_eq!(SelectedItem::from_value(&json!("not-a-ref")).node_ref(), None);
        assert_eq!(
            SelectedItem::from_value(&json!({ "nodeRef": "anything", "name": "x" })).node_ref(),
            Some("anything")
        );
        assert_eq!(SelectedItem::from_value(&json!({ "nodeRef": 7 })).node_ref(), None);
        assert_eq!(SelectedItem::from_value(&json!(null)).node_ref(), None);
    }

    #[test]
    fn test_node_reference_shape() {
        assert!(is_node_reference("workspace://SpacesStore/1234"));
        assert!(is_node_reference("archive://SpacesStore/a/b"));
        assert!(!is_node_reference("://SpacesStore/1234"));
        assert!(!is_node_reference("a:b://SpacesStore/1234"));
        assert!(!is_node_reference("workspace://SpacesStore"));
        assert!(!is_node_reference("workspace:///1234"));
        assert!(!is_node_reference("workspace://SpacesStore/"));
    }
}
