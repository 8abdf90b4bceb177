use serde_json::json;
use std::sync::Arc;
use topic_bus::mock::{PublicationLog, TopicWatcher};
use topic_bus::PublishOptions;
use trash_management::config::ServiceConfig;
use trash_management::lifecycle::TrashSystem;
use trash_management::model::HttpMethod;
use trash_management::transport::mock::MockTransport;
use trash_management::transport::TransportError;

fn start(mock: &MockTransport) -> TrashSystem {
    TrashSystem::start(ServiceConfig::default(), Arc::new(mock.clone()))
}

/// Query with paging reaches the backend with a start index and the reply lands
/// on the default success topic.
#[tokio::test]
async fn test_query_with_paging_round_trip() {
    let mock = MockTransport::new();
    mock.expect_call().return_ok(json!({ "items": [{ "name": "a.txt" }], "totalRecords": 21 }));
    let system = start(&mock);
    let mut success = TopicWatcher::attach(&system.bus, "QUERY_ARCHIVED_ITEMS_SUCCESS");

    system.bus.publish(
        "QUERY_ARCHIVED_ITEMS",
        &json!({ "page": 2, "pageSize": 20 }),
        PublishOptions::global(),
    );

    let reply = success.next().await.expect("success reply");
    assert_eq!(reply["totalRecords"], 21);

    let calls = mock.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, HttpMethod::Get);
    assert_eq!(calls[0].query_parameter("page"), Some("2"));
    assert_eq!(calls[0].query_parameter("pageSize"), Some("20"));
    assert_eq!(calls[0].query_parameter("startIndex"), Some("20"));
    assert_eq!(calls[0].query_parameter("baseStore"), Some("workspace://SpacesStore"));

    mock.verify();
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_query_with_open_ended_archive_date() {
    let mock = MockTransport::new();
    mock.expect_call().return_ok(json!({ "items": [] }));
    let system = start(&mock);
    let mut success = TopicWatcher::attach(&system.bus, "QUERY_ARCHIVED_ITEMS_SUCCESS");

    system.bus.publish(
        "QUERY_ARCHIVED_ITEMS",
        &json!({ "dataFilters": [{ "name": "archiveDate", "value": "2024-01-01|" }] }),
        PublishOptions::global(),
    );
    success.next().await.expect("success reply");

    let call = &mock.calls()[0];
    assert_eq!(call.query_parameter("archiveDateFrom"), Some("2024-01-01"));
    assert_eq!(call.query_parameter("archiveDateTo"), None);
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_browse_without_node_ref_fails_without_a_call() {
    let mock = MockTransport::new();
    let system = start(&mock);
    let mut failure = TopicWatcher::attach(&system.bus, "BROWSE_ARCHIVED_ITEMS_FAILURE");

    system
        .bus
        .publish("BROWSE_ARCHIVED_ITEMS", &json!({ "page": 1 }), PublishOptions::global());

    assert_eq!(failure.try_next(), Some(json!({})));
    assert!(mock.calls().is_empty());
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_browse_children_of_node() {
    let mock = MockTransport::new();
    mock.expect_call().return_ok(json!({ "items": [] }));
    let system = start(&mock);
    let mut success = TopicWatcher::attach(&system.bus, "FOLDER/CHILDREN_SUCCESS");

    system.bus.publish(
        "BROWSE_ARCHIVED_ITEMS",
        &json!({
            "nodeRef": "archive://SpacesStore/f00d",
            "alfResponseTopic": "CHILDREN",
            "alfResponseScope": "FOLDER/"
        }),
        PublishOptions::global(),
    );

    success.next().await.expect("scoped success reply");
    assert_eq!(
        mock.calls()[0].endpoint,
        "api/better-trash-management/archivedItems/archive/SpacesStore/f00d/children"
    );
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_delete_selected_items_in_one_bulk_call() {
    let mock = MockTransport::new();
    mock.expect_call().return_ok(json!({ "deleted": 1 }));
    let system = start(&mock);
    let mut done = TopicWatcher::attach(&system.bus, "RELOAD_TRASH");

    system.bus.publish(
        "DELETE_ARCHIVED_ITEMS",
        &json!({ "selectedItems": ["store://a/b"], "successTopic": "RELOAD_TRASH" }),
        PublishOptions::global(),
    );

    assert_eq!(done.next().await, Some(json!({ "deleted": 1 })));
    let call = &mock.calls()[0];
    assert_eq!(call.method, HttpMethod::Post);
    assert_eq!(call.endpoint, "api/better-trash-management/archivedItems/bulkDelete");
    assert_eq!(call.body, Some(json!({ "nodes": ["store://a/b"] })));
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_delete_with_nothing_selected_does_nothing() {
    let mock = MockTransport::new();
    let system = start(&mock);
    let log = PublicationLog::attach(
        &system.bus,
        ["DELETE_ARCHIVED_ITEMS_SUCCESS", "DELETE_ARCHIVED_ITEMS_FAILURE"],
    );

    system.bus.publish(
        "DELETE_ARCHIVED_ITEMS",
        &json!({ "selectedItems": ["not a reference", { "name": "x" }] }),
        PublishOptions::global(),
    );
    tokio::task::yield_now().await;

    assert!(mock.calls().is_empty());
    assert!(log.entries().is_empty());
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_backend_error_forwarded_to_scoped_failure_topic() {
    let mock = MockTransport::new();
    mock.expect_call().return_err(TransportError::Status {
        status: 500,
        body: json!({ "message": "Solr is down" }),
    });
    let system = start(&mock);
    let mut failure = TopicWatcher::attach(&system.bus, "PANEL/LIST_FAILURE");
    let mut success = TopicWatcher::attach(&system.bus, "PANEL/LIST_SUCCESS");

    system.bus.publish(
        "QUERY_ARCHIVED_ITEMS",
        &json!({ "responseTopic": "LIST", "responseScope": "PANEL/" }),
        PublishOptions::global(),
    );

    assert_eq!(failure.next().await, Some(json!({ "message": "Solr is down" })));
    assert!(success.try_next().is_none());
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_legacy_success_topic_is_honoured() {
    let mock = MockTransport::new();
    mock.expect_call().return_ok(json!({}));
    let system = start(&mock);
    let mut legacy = TopicWatcher::attach(&system.bus, "ITEMS_LOADED");

    system.bus.publish(
        "QUERY_ARCHIVED_ITEMS",
        &json!({ "alfSucessTopic": "ITEMS_LOADED", "responseTopic": "IGNORED" }),
        PublishOptions::global(),
    );

    assert!(legacy.next().await.is_some());
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_publish_chain_in_order() {
    let mock = MockTransport::new();
    let system = start(&mock);
    let log = PublicationLog::attach(&system.bus, ["DISABLE_TAB", "SELECT_TAB", "TREE/RELOAD"]);

    system.bus.publish(
        "PUBLISH_CHAIN",
        &json!({
            "responseScope": "DIALOG/",
            "publications": [
                { "publishTopic": ["DISABLE_TAB", "SELECT_TAB"], "publishPayload": { "index": 2 } },
                { "publishTopic": "RELOAD", "publishScope": "TREE/" }
            ]
        }),
        PublishOptions::global(),
    );

    let entries = log.entries();
    assert_eq!(log.topics(), vec!["DISABLE_TAB", "SELECT_TAB", "TREE/RELOAD"]);
    assert_eq!(entries[0].1, json!({ "index": 2, "responseScope": "DIALOG/" }));
    assert_eq!(entries[1].1, entries[0].1);
    assert_eq!(entries[2].1, json!({}));
    assert!(mock.calls().is_empty());
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_stops_serving_requests() {
    let mock = MockTransport::new();
    let system = start(&mock);
    let bus = system.bus.clone();

    system.shutdown().await.unwrap();
    bus.publish("QUERY_ARCHIVED_ITEMS", &json!({}), PublishOptions::global());

    assert_eq!(bus.subscriber_count("QUERY_ARCHIVED_ITEMS"), 0);
    assert!(mock.calls().is_empty());
}
