//! Tests for the item store: list/detail caching, mutation side effects,
//! and the optimistic image-rotation protocol.

mod common;

use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use common::{harness, item_json, item_page, Harness};
use serde_json::json;
use std::sync::Arc;
use studybank_core::domain::{ItemPatch, NewAnswer, NewItem, Rotation};
use studybank_core::ports::{ApiResponse, HttpMethod, PortError, RequestBody};
use studybank_core::{ItemStatus, ItemStore, ListFilter};

async fn store_with_current(h: &Harness, id: i64) -> Arc<ItemStore> {
    let store = Arc::new(ItemStore::new(h.api.clone()));
    h.transport.reply(200, item_json(id));
    store.fetch_one(id).await.expect("item should load");
    store
}

// ---------------------------------------------------------------------------
// Test: list fetch replaces the page, failure keeps it
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_list_replaces_records_and_pagination() {
    let h = harness(Some("tok"));
    let store = ItemStore::new(h.api.clone());
    h.transport.reply(200, item_page(&[1, 2], 2, 12, 2));

    store
        .fetch_list(&ListFilter {
            page: Some(2),
            ..Default::default()
        })
        .await;

    assert_eq!(store.list().iter().map(|i| i.id).collect::<Vec<_>>(), vec![1, 2]);
    let pagination = store.pagination();
    assert_eq!((pagination.page, pagination.per_page), (2, 10));
    assert_eq!((pagination.total, pagination.pages), (12, 2));
    assert_eq!(store.error(), None);
    assert!(!store.is_loading());
}

#[tokio::test]
async fn failed_list_fetch_keeps_stale_page() {
    let h = harness(Some("tok"));
    let store = ItemStore::new(h.api.clone());
    h.transport.reply(200, item_page(&[1, 2, 3], 1, 3, 1));
    store.fetch_list(&ListFilter::default()).await;
    let before = (store.list(), store.pagination());

    h.transport.reply(500, json!({ "error": "Database unavailable" }));
    store.fetch_list(&ListFilter::default().page(2)).await;

    assert_eq!((store.list(), store.pagination()), before);
    assert_eq!(store.error().as_deref(), Some("Database unavailable"));
}

#[tokio::test]
async fn transport_failure_records_generic_message() {
    let h = harness(Some("tok"));
    let store = ItemStore::new(h.api.clone());
    h.transport
        .reply_error(PortError::Transport("connection reset".to_string()));

    store.fetch_list(&ListFilter::default()).await;

    assert_eq!(store.error().as_deref(), Some("Failed to fetch items"));
    assert!(store.list().is_empty());
}

#[tokio::test]
async fn set_page_drives_the_next_fetch() {
    let h = harness(Some("tok"));
    let store = ItemStore::new(h.api.clone());
    h.transport.reply(200, item_page(&[4], 3, 21, 3));

    store.set_page(3);
    store.fetch_list(&ListFilter::default()).await;

    assert_eq!(h.transport.last_request().query_value("page"), Some("3"));
    assert_eq!(store.pagination().page, 3);
}

// ---------------------------------------------------------------------------
// Test: detail fetch and mutations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_fetch_one_keeps_current() {
    let h = harness(Some("tok"));
    let store = store_with_current(&h, 5).await;
    h.transport.reply(404, json!({ "error": "Not found" }));

    assert!(store.fetch_one(6).await.is_none());

    assert_eq!(store.current().map(|i| i.id), Some(5));
    assert_eq!(store.error().as_deref(), Some("Not found"));
}

#[tokio::test]
async fn create_returns_record_without_touching_list() {
    let h = harness(Some("tok"));
    let store = ItemStore::new(h.api.clone());
    h.transport.reply(201, item_json(10));

    let payload = NewItem {
        subject: Some("MATHS".to_string()),
        difficulty: 2,
        title: Some("Item 10".to_string()),
        ..Default::default()
    };
    let created = store.create(&payload).await.unwrap();

    assert_eq!(created.id, 10);
    assert!(store.list().is_empty());
    assert!(store.current().is_none());
    let request = h.transport.last_request();
    assert_eq!((request.method, request.path.as_str()), (HttpMethod::Post, "/items"));
}

#[tokio::test]
async fn update_replaces_current_and_failure_leaves_it() {
    let h = harness(Some("tok"));
    let store = store_with_current(&h, 5).await;

    let mut updated = item_json(5);
    updated["title"] = json!("Renamed");
    h.transport.reply(200, updated);
    let patch = ItemPatch {
        title: Some("Renamed".to_string()),
        ..Default::default()
    };
    store.update(5, &patch).await.unwrap();
    assert_eq!(store.current().and_then(|i| i.title).as_deref(), Some("Renamed"));
    assert_eq!(
        h.transport.last_request().body,
        RequestBody::Json(json!({ "title": "Renamed" }))
    );

    h.transport.reply(400, json!({ "error": "Validation failed" }));
    let result = store.update(5, &ItemPatch::default()).await;
    assert_matches!(result, Err(PortError::Validation { status: 400, .. }));
    assert_eq!(store.current().and_then(|i| i.title).as_deref(), Some("Renamed"));
    assert_eq!(store.error().as_deref(), Some("Validation failed"));
}

#[tokio::test]
async fn delete_drops_list_entry_but_keeps_current() {
    let h = harness(Some("tok"));
    let store = store_with_current(&h, 2).await;
    h.transport.reply(200, item_page(&[1, 2, 3], 1, 3, 1));
    store.fetch_list(&ListFilter::default()).await;
    h.transport
        .reply(200, json!({ "message": "Item deleted successfully" }));

    store.delete(2).await.unwrap();

    assert_eq!(store.list().iter().map(|i| i.id).collect::<Vec<_>>(), vec![1, 3]);
    assert_eq!(store.current().map(|i| i.id), Some(2));
}

// ---------------------------------------------------------------------------
// Test: optimistic rotation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rotation_is_visible_before_response_and_reverted_on_failure() {
    let h = harness(Some("tok"));
    let store = store_with_current(&h, 5).await;
    let updated_at_before = store.current().unwrap().updated_at;
    let gate = h.transport.gate();

    let task = tokio::spawn({
        let store = store.clone();
        async move { store.rotate_image(5, 0, Rotation::Deg90).await }
    });
    h.transport.wait_for_requests(2).await;

    let pending = store.current().unwrap();
    assert_eq!(pending.images[0].rotation, Rotation::Deg90);
    assert_eq!(pending.images[1].rotation, Rotation::Deg0);

    gate.send(Ok(ApiResponse::json(400, &json!({ "error": "Invalid rotation" }))))
        .unwrap();
    let result = task.await.unwrap();

    assert_matches!(result, Err(PortError::Validation { .. }));
    let reverted = store.current().unwrap();
    assert_eq!(reverted.images[0].rotation, Rotation::Deg0);
    assert_eq!(reverted.updated_at, updated_at_before);
}

#[tokio::test]
async fn successful_rotation_keeps_images_and_takes_server_timestamp() {
    let h = harness(Some("tok"));
    let store = store_with_current(&h, 5).await;
    h.transport.reply(
        200,
        json!({ "rotation": 90, "image_index": 0, "updated_at": "2024-02-02T12:00:00" }),
    );

    let response = store.rotate_image(5, 0, Rotation::Deg90).await.unwrap();

    assert_eq!(response.map(|r| r.rotation), Some(Rotation::Deg90));
    let current = store.current().unwrap();
    assert_eq!(current.images[0].rotation, Rotation::Deg90);
    assert_eq!(
        current.updated_at,
        Some(Utc.with_ymd_and_hms(2024, 2, 2, 12, 0, 0).unwrap())
    );
    assert_eq!(
        h.transport.last_request().body,
        RequestBody::Json(json!({ "image_index": 0, "rotation": 90 }))
    );
    assert_eq!(h.transport.last_request().path, "/items/5/rotate");
}

#[tokio::test]
async fn rotation_without_current_item_is_a_no_op() {
    let h = harness(Some("tok"));
    let store = ItemStore::new(h.api.clone());

    let result = store.rotate_image(5, 0, Rotation::Deg90).await;

    assert_matches!(result, Ok(None));
    assert!(h.transport.requests().is_empty());
}

#[tokio::test]
async fn out_of_range_rotation_changes_nothing_but_still_asks_the_server() {
    let h = harness(Some("tok"));
    let store = store_with_current(&h, 5).await;
    let before = store.current().unwrap();
    h.transport
        .reply(400, json!({ "error": "Invalid image index" }));

    let result = store.rotate_image(5, 7, Rotation::Deg90).await;

    assert_matches!(result, Err(PortError::Validation { status: 400, .. }));
    assert_eq!(store.current().unwrap(), before);
    assert_eq!(store.error().as_deref(), Some("Invalid image index"));
    assert_eq!(
        h.transport.last_request().body,
        RequestBody::Json(json!({ "image_index": 7, "rotation": 90 }))
    );
}

// ---------------------------------------------------------------------------
// Test: review flag and answers update the matching current item
// ---------------------------------------------------------------------------

#[tokio::test]
async fn toggle_review_mirrors_server_value() {
    let h = harness(Some("tok"));
    let store = store_with_current(&h, 5).await;
    h.transport
        .reply(200, json!({ "id": 5, "needs_review": true }));

    assert!(store.toggle_review(5, true).await.unwrap());

    assert!(store.current().unwrap().needs_review);
    assert_eq!(h.transport.last_request().path, "/items/5/review");
}

#[tokio::test]
async fn wrong_answer_flags_current_item_for_review() {
    let h = harness(Some("tok"));
    let store = store_with_current(&h, 5).await;
    h.transport.reply(
        201,
        json!({
            "message": "Answer submitted successfully",
            "answer": { "id": 1, "item_id": 5, "user_id": 1, "is_correct": false, "duration_seconds": 40 },
            "item_status": "ANSWERED"
        }),
    );

    let answer = NewAnswer {
        is_correct: false,
        content: None,
        duration_seconds: 40,
    };
    store.submit_answer(5, &answer).await.unwrap();

    let current = store.current().unwrap();
    assert_eq!(current.status, ItemStatus::Answered);
    assert!(current.needs_review);
    assert_eq!(current.attempts, 1);
}

#[tokio::test]
async fn review_session_passes_limit_and_subject() {
    let h = harness(Some("tok"));
    let store = ItemStore::new(h.api.clone());
    h.transport.reply(200, json!([item_json(3), item_json(8)]));

    let items = store.review_session(Some(2), Some("MATHS")).await.unwrap();

    assert_eq!(items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![3, 8]);
    let request = h.transport.last_request();
    assert_eq!(request.path, "/items/review-session");
    assert_eq!(request.query_value("limit"), Some("2"));
    assert_eq!(request.query_value("subject"), Some("MATHS"));
    assert!(!store.is_loading());
}

#[tokio::test]
async fn answer_history_returns_attempts_in_server_order() {
    let h = harness(Some("tok"));
    let store = ItemStore::new(h.api.clone());
    h.transport.reply(
        200,
        json!([
            { "id": 2, "item_id": 5, "user_id": 1, "is_correct": true, "duration_seconds": 30, "created_at": "2024-01-03T10:00:00" },
            { "id": 1, "item_id": 5, "user_id": 1, "is_correct": false, "duration_seconds": 40, "created_at": "2024-01-02T10:00:00" }
        ]),
    );

    let history = store.answer_history(5).await.unwrap();

    assert_eq!(history.iter().map(|a| a.id).collect::<Vec<_>>(), vec![2, 1]);
    assert!(history[0].is_correct);
    assert_eq!(h.transport.last_request().path, "/items/5/answers");
    assert_eq!(h.transport.last_request().method, HttpMethod::Get);
}

#[tokio::test]
async fn failed_answer_history_records_fallback_message() {
    let h = harness(Some("tok"));
    let store = ItemStore::new(h.api.clone());
    h.transport
        .reply_error(PortError::Transport("connection reset".to_string()));

    assert_matches!(store.answer_history(5).await, Err(PortError::Transport(_)));
    assert_eq!(store.error().as_deref(), Some("Failed to fetch answer history"));
}
