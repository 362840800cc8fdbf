//! Integration tests for the read routes, read receipts and dead letters.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

use helpers::{TestApp, class_of_ten};
use notify_core::types::NotificationId;
use notify_entity::delivery::{DeliveryMethod, DeliveryStatus};

async fn circular(app: &TestApp, methods: serde_json::Value) -> NotificationId {
    app.create(
        "/api/notifications/circular",
        json!({ "title": "Uniform", "message": "Winter uniform from Monday", "delivery_methods": methods }),
    )
    .await
}

#[tokio::test]
async fn test_statistics_success_rate() {
    let app = TestApp::new(vec![]);
    let id = circular(&app, json!([])).await;

    for (rid, status) in (1..=5)
        .map(|r| (r, DeliveryStatus::Delivered))
        .chain((6..=7).map(|r| (r, DeliveryStatus::Read)))
        .chain((8..=9).map(|r| (r, DeliveryStatus::Failed)))
        .chain(std::iter::once((10, DeliveryStatus::Pending)))
    {
        app.seed_delivery(id, rid, DeliveryMethod::Sms, status, 0);
    }

    let response = app
        .request("GET", &format!("/api/notifications/{id}/statistics"), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let stats = response.data();
    assert_eq!(stats["total"], 10);
    assert_eq!(stats["successful"], 7);
    assert_eq!(stats["failed"], 2);
    assert_eq!(stats["pending"], 1);
    assert_eq!(stats["success_rate"], 70.0);
}

#[tokio::test]
async fn test_statistics_of_empty_notification() {
    let app = TestApp::new(vec![]);
    let id = circular(&app, json!(["SMS"])).await;

    let response = app
        .request("GET", &format!("/api/notifications/{id}/statistics"), None)
        .await;
    assert_eq!(response.data()["total"], 0);
    assert_eq!(response.data()["success_rate"], 0.0);
}

#[tokio::test]
async fn test_mark_read_is_idempotent() {
    let app = TestApp::new(class_of_ten());
    let id = circular(&app, json!(["IN_APP"])).await;
    app.run_dispatches().await;

    let unread = app.request("GET", "/api/notifications/unread/3", None).await;
    assert_eq!(unread.data().as_array().unwrap().len(), 1);

    let first = app
        .request("PUT", &format!("/api/notifications/{id}/read/3"), None)
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.data()["count"], 1);

    let second = app
        .request("PUT", &format!("/api/notifications/{id}/read/3"), None)
        .await;
    assert_eq!(second.data()["count"], 0);

    let unread = app.request("GET", "/api/notifications/unread/3", None).await;
    assert!(unread.data().as_array().unwrap().is_empty());

    let deliveries = app
        .request("GET", &format!("/api/notifications/{id}/deliveries"), None)
        .await;
    let read: Vec<_> = deliveries
        .data()
        .as_array()
        .unwrap()
        .iter()
        .filter(|d| d["status"] == "READ")
        .collect();
    assert_eq!(read.len(), 1);
    assert_eq!(read[0]["recipient_id"], 3);
    assert!(read[0]["read_at"].is_string());
}

#[tokio::test]
async fn test_list_and_filters() {
    let app = TestApp::new(vec![]);
    for _ in 0..3 {
        circular(&app, json!([])).await;
    }
    app.create(
        "/api/notifications/emergency",
        json!({ "title": "Gas leak", "message": "Evacuated to ground" }),
    )
    .await;

    let page = app
        .request("GET", "/api/notifications?page=1&per_page=2", None)
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.data()["items"].as_array().unwrap().len(), 2);
    assert_eq!(page.data()["total_items"], 4);
    assert_eq!(page.data()["total_pages"], 2);

    let by_type = app
        .request("GET", "/api/notifications/type/EMERGENCY", None)
        .await;
    assert_eq!(by_type.data().as_array().unwrap().len(), 1);

    let by_status = app
        .request("GET", "/api/notifications/status/scheduled", None)
        .await;
    assert_eq!(by_status.data().as_array().unwrap().len(), 4);

    let bad_type = app.request("GET", "/api/notifications/type/PICNIC", None).await;
    assert_eq!(bad_type.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_lookup_errors() {
    let app = TestApp::new(vec![]);

    let missing = app
        .request("GET", &format!("/api/notifications/{}", NotificationId::new()), None)
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["error"], "NOT_FOUND");

    let malformed = app.request("GET", "/api/notifications/not-a-uuid", None).await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_enum_listings() {
    let app = TestApp::new(vec![]);

    let types = app.request("GET", "/api/notifications/types", None).await;
    let types = types.data().as_array().unwrap().clone();
    assert_eq!(types.len(), 9);
    assert_eq!(types[0]["value"], "HOLIDAY");
    assert!(types[0]["label"].is_string());

    let audiences = app
        .request("GET", "/api/notifications/target-audiences", None)
        .await;
    assert_eq!(audiences.data().as_array().unwrap().len(), 6);

    let methods = app
        .request("GET", "/api/notifications/delivery-methods", None)
        .await;
    let push = methods
        .data()
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["value"] == "PUSH")
        .cloned()
        .unwrap();
    assert_eq!(push["available"], false);
}

#[tokio::test]
async fn test_dead_letter_listing_and_requeue() {
    let app = TestApp::new(vec![]);
    let id = circular(&app, json!(["SMS"])).await;
    let dead = app.seed_delivery(id, 1, DeliveryMethod::Sms, DeliveryStatus::DeadLettered, 3);
    app.seed_delivery(id, 2, DeliveryMethod::Sms, DeliveryStatus::DeadLettered, 3);
    let failed = app.seed_delivery(id, 3, DeliveryMethod::Sms, DeliveryStatus::Failed, 1);

    let listed = app.request("GET", "/api/notifications/dead-letters", None).await;
    assert_eq!(listed.data().as_array().unwrap().len(), 2);

    let requeued = app
        .request(
            "POST",
            &format!("/api/notifications/deliveries/{}/requeue", dead.id),
            None,
        )
        .await;
    assert_eq!(requeued.status, StatusCode::OK);
    assert_eq!(requeued.data()["status"], "FAILED");
    assert_eq!(requeued.data()["retry_count"], 0);

    let not_dead = app
        .request(
            "POST",
            &format!("/api/notifications/deliveries/{}/requeue", failed.id),
            None,
        )
        .await;
    assert_eq!(not_dead.status, StatusCode::CONFLICT);

    let all = app
        .request("POST", "/api/notifications/dead-letters/requeue", None)
        .await;
    assert_eq!(all.data()["requeued"], 1);

    let listed = app.request("GET", "/api/notifications/dead-letters", None).await;
    assert!(listed.data().as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new(vec![]);
    let response = app.request("GET", "/api/health", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "ok");
    assert_eq!(response.data()["database"], "not_configured");
    assert_eq!(
        response.data()["channels"],
        json!(["IN_APP", "EMAIL", "SMS", "WHATSAPP"])
    );
}
