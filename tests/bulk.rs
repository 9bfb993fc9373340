mod common;

use std::sync::Arc;

use serde_json::json;

use common::MockTransport;
use search_ext::{ActionParams, BulkDefaults, Error, SearchClient};

fn client() -> (SearchClient, Arc<MockTransport>) {
    let transport = Arc::new(MockTransport::default());
    (SearchClient::with_transport(transport.clone()), transport)
}

#[tokio::test]
async fn test_flush_renders_actions_in_record_order() {
    let (client, transport) = client();
    let bulk = client.bulk(BulkDefaults::default());

    bulk.index(
        json!({ "key1": "val1" }),
        None,
        ActionParams {
            index: Some("other_bulk_index".to_string()),
            doc_type: Some("docs".to_string()),
            ..ActionParams::default()
        },
    )
    .unwrap();
    bulk.create(
        json!({ "key2": "val2" }),
        Some("doc-2"),
        ActionParams::default(),
    )
    .unwrap();
    bulk.update("doc-3", json!({ "doc": { "key3": "val3" } }), ActionParams::default())
        .unwrap();
    bulk.delete("doc-4", ActionParams::default()).unwrap();
    assert_eq!(bulk.len(), 4);

    bulk.flush(None).await.unwrap();

    let batches = transport.batches.lock().unwrap();
    let (body, _) = &batches[0];
    assert_eq!(
        body,
        "{\"index\":{\"_index\":\"other_bulk_index\",\"_type\":\"docs\"}}\n\
         {\"key1\":\"val1\"}\n\
         {\"create\":{\"_id\":\"doc-2\"}}\n\
         {\"key2\":\"val2\"}\n\
         {\"update\":{\"_id\":\"doc-3\"}}\n\
         {\"doc\":{\"key3\":\"val3\"}}\n\
         {\"delete\":{\"_id\":\"doc-4\"}}\n"
    );
}

#[tokio::test]
async fn test_flush_clears_pending_and_returns_items() {
    let (client, _) = client();
    let bulk = client.bulk(BulkDefaults::default());

    bulk.index(json!({ "a": 1 }), None, ActionParams::default())
        .unwrap();
    bulk.delete("x", ActionParams::default()).unwrap();

    let response = bulk.flush(None).await.unwrap();
    // Per-action results come back unmodified: three rendered lines
    // (header, body, header) in this batch.
    assert_eq!(response["items"].as_array().unwrap().len(), 3);
    assert_eq!(response["errors"], false);

    assert!(bulk.is_empty());
    let err = bulk.flush(None).await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[tokio::test]
async fn test_flush_overrides_win_over_defaults() {
    let (client, transport) = client();
    let bulk = client.bulk(BulkDefaults {
        index: Some("default_index".to_string()),
        refresh: Some(true),
        ..BulkDefaults::default()
    });

    bulk.index(json!({ "a": 1 }), None, ActionParams::default())
        .unwrap();
    bulk.flush(Some(&BulkDefaults {
        index: Some("some_other_index".to_string()),
        refresh: Some(false),
        ..BulkDefaults::default()
    }))
    .await
    .unwrap();

    let batches = transport.batches.lock().unwrap();
    let (_, params) = &batches[0];
    assert_eq!(params["index"], "some_other_index");
    assert_eq!(params["refresh"], "false");
}

#[tokio::test]
async fn test_defaults_submitted_when_not_overridden() {
    let (client, transport) = client();
    let bulk = client.bulk(BulkDefaults {
        index: Some("default_index".to_string()),
        refresh: Some(true),
        routing: Some("r1".to_string()),
        ..BulkDefaults::default()
    });

    bulk.delete("x", ActionParams::default()).unwrap();
    bulk.flush(Some(&BulkDefaults {
        refresh: Some(false),
        ..BulkDefaults::default()
    }))
    .await
    .unwrap();

    let batches = transport.batches.lock().unwrap();
    let (_, params) = &batches[0];
    assert_eq!(params["index"], "default_index");
    assert_eq!(params["routing"], "r1");
    assert_eq!(params["refresh"], "false");
}

#[tokio::test]
async fn test_rejected_action_leaves_pending_unchanged() {
    let (client, transport) = client();
    let bulk = client.bulk(BulkDefaults::default());

    bulk.index(json!({ "a": 1 }), None, ActionParams::default())
        .unwrap();

    let err = bulk
        .update("doc-1", serde_json::Value::Null, ActionParams::default())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidBulkAction(_)));
    assert_eq!(bulk.len(), 1);

    assert!(transport.batches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_flush_submits_nothing() {
    let (client, transport) = client();
    let bulk = client.bulk(BulkDefaults::default());

    let err = bulk.flush(None).await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(transport.batches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_flush_keeps_records_for_retry() {
    use std::sync::atomic::Ordering;

    let (client, transport) = client();
    let bulk = client.bulk(BulkDefaults::default());

    bulk.delete("one", ActionParams::default()).unwrap();
    bulk.delete("two", ActionParams::default()).unwrap();

    transport.fail_submit.store(true, Ordering::SeqCst);
    let err = bulk.flush(None).await.unwrap_err();
    assert!(matches!(err, Error::Api { status: 503, .. }));

    // The engine never applied the batch; the records are still
    // pending, ahead of anything recorded afterwards.
    assert_eq!(bulk.len(), 2);
    bulk.delete("three", ActionParams::default()).unwrap();

    transport.fail_submit.store(false, Ordering::SeqCst);
    bulk.flush(None).await.unwrap();

    let batches = transport.batches.lock().unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(
        batches[0].0,
        "{\"delete\":{\"_id\":\"one\"}}\n\
         {\"delete\":{\"_id\":\"two\"}}\n\
         {\"delete\":{\"_id\":\"three\"}}\n"
    );
    assert!(bulk.is_empty());
}

#[tokio::test]
async fn test_records_appended_after_flush_go_to_next_batch() {
    let (client, transport) = client();
    let bulk = client.bulk(BulkDefaults::default());

    bulk.delete("one", ActionParams::default()).unwrap();
    bulk.delete("two", ActionParams::default()).unwrap();
    bulk.flush(None).await.unwrap();

    bulk.delete("three", ActionParams::default()).unwrap();
    bulk.flush(None).await.unwrap();

    let batches = transport.batches.lock().unwrap();
    assert_eq!(batches.len(), 2);
    assert_eq!(
        batches[0].0,
        "{\"delete\":{\"_id\":\"one\"}}\n{\"delete\":{\"_id\":\"two\"}}\n"
    );
    assert_eq!(batches[1].0, "{\"delete\":{\"_id\":\"three\"}}\n");
}

#[tokio::test]
async fn test_explicit_id_overrides_params_id() {
    let (client, transport) = client();
    let bulk = client.bulk(BulkDefaults::default());

    bulk.create(
        json!({ "a": 1 }),
        Some("winner"),
        ActionParams {
            id: Some("loser".to_string()),
            ..ActionParams::default()
        },
    )
    .unwrap();
    bulk.flush(None).await.unwrap();

    let batches = transport.batches.lock().unwrap();
    assert!(batches[0].0.starts_with("{\"create\":{\"_id\":\"winner\"}}\n"));
}
