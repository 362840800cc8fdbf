//! Integration tests for the retry sweeper and dead-letter recovery.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

use helpers::{TestApp, class_of_ten};
use notify_core::types::NotificationId;
use notify_database::DeliveryStore;
use notify_entity::delivery::{DeliveryMethod, DeliveryStatus};

async fn sms_circular(app: &TestApp) -> NotificationId {
    app.create(
        "/api/notifications/circular",
        json!({ "title": "Bus route", "message": "Route 4 starts 10 minutes early", "delivery_methods": ["SMS"] }),
    )
    .await
}

#[tokio::test]
async fn test_failed_sends_recover_on_next_sweep() {
    let app = TestApp::new(class_of_ten().into_iter().take(2).collect());
    app.sms.set_failing(true);

    let id = sms_circular(&app).await;
    app.run_dispatches().await;

    let stats = app
        .request("GET", &format!("/api/notifications/{id}/statistics"), None)
        .await;
    assert_eq!(stats.data()["failed"], 2);

    app.sms.set_failing(false);
    let report = app.sweeper.sweep().await.unwrap();
    assert_eq!(report.examined, 2);
    assert_eq!(report.delivered, 2);

    let deliveries = app.deliveries.find_by_notification(id).await.unwrap();
    assert!(deliveries.iter().all(|d| d.status == DeliveryStatus::Delivered));
    assert!(deliveries.iter().all(|d| d.retry_count == 0));
    assert_eq!(app.sms.send_count(), 2);
}

#[tokio::test]
async fn test_last_retry_success_keeps_count() {
    let app = TestApp::new(class_of_ten());
    let id = sms_circular(&app).await;
    let row = app.seed_delivery(id, 4, DeliveryMethod::Sms, DeliveryStatus::Failed, 2);

    let report = app.sweeper.sweep().await.unwrap();
    assert_eq!(report.delivered, 1);

    let row = app.deliveries.find_by_id(row.id).await.unwrap().unwrap();
    assert_eq!(row.status, DeliveryStatus::Delivered);
    assert_eq!(row.retry_count, 2);
}

#[tokio::test]
async fn test_last_retry_failure_dead_letters() {
    let app = TestApp::new(class_of_ten());
    app.sms.set_failing(true);
    let id = sms_circular(&app).await;
    let row = app.seed_delivery(id, 4, DeliveryMethod::Sms, DeliveryStatus::Failed, 2);

    let report = app.sweeper.sweep().await.unwrap();
    assert_eq!(report.dead_lettered, 1);

    let row = app.deliveries.find_by_id(row.id).await.unwrap().unwrap();
    assert_eq!(row.status, DeliveryStatus::DeadLettered);
    assert_eq!(row.retry_count, 3);
    assert!(row.dead_lettered_at.is_some());

    let next = app.sweeper.sweep().await.unwrap();
    assert_eq!(next.examined, 0);

    let listed = app.request("GET", "/api/notifications/dead-letters", None).await;
    assert_eq!(listed.data().as_array().unwrap().len(), 1);
    assert_eq!(listed.data()[0]["id"], row.id.to_string());
}

#[tokio::test]
async fn test_directory_outage_keeps_retry_budget() {
    let app = TestApp::new(class_of_ten());
    let id = sms_circular(&app).await;
    let row = app.seed_delivery(id, 5, DeliveryMethod::Sms, DeliveryStatus::Failed, 1);
    app.directory.set_down(true);

    let report = app.sweeper.sweep().await.unwrap();
    assert_eq!(report.skipped, 1);

    let row = app.deliveries.find_by_id(row.id).await.unwrap().unwrap();
    assert_eq!(row.status, DeliveryStatus::Failed);
    assert_eq!(row.retry_count, 1);
}

#[tokio::test]
async fn test_requeued_dead_letter_is_retried() {
    let app = TestApp::new(class_of_ten());
    let id = sms_circular(&app).await;
    let row = app.seed_delivery(id, 6, DeliveryMethod::Sms, DeliveryStatus::DeadLettered, 3);

    assert_eq!(app.sweeper.sweep().await.unwrap().examined, 0);

    let response = app
        .request(
            "POST",
            &format!("/api/notifications/deliveries/{}/requeue", row.id),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let report = app.sweeper.sweep().await.unwrap();
    assert_eq!(report.delivered, 1);
    let row = app.deliveries.find_by_id(row.id).await.unwrap().unwrap();
    assert_eq!(row.status, DeliveryStatus::Delivered);
}
