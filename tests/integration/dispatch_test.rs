//! Integration tests for the create-and-dispatch routes.

mod helpers;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

use helpers::{TestApp, class_of_ten, student};
use notify_database::DeliveryStore;
use notify_service::orchestrator::DispatchOutcome;

#[tokio::test]
async fn test_holiday_sms_dedups_shared_parent_phone() {
    let app = TestApp::new(vec![
        student(1, Some("9876543210"), None),
        student(2, Some("09876543210"), None),
        student(3, Some("+91 98765 43210"), None),
    ]);

    let id = app
        .create(
            "/api/notifications/holiday",
            json!({
                "title": "Diwali",
                "message": "School closed on Friday",
                "holiday_date": (Utc::now() + Duration::days(3)).to_rfc3339(),
                "delivery_methods": ["SMS"],
            }),
        )
        .await;

    let summaries = app.run_dispatches().await;
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].outcome, DispatchOutcome::Sent);
    assert_eq!(app.deliveries.find_by_notification(id).await.unwrap().len(), 1);
    assert_eq!(app.sms.send_count(), 1);

    let response = app.request("GET", &format!("/api/notifications/{id}"), None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "SENT");
    assert_eq!(response.data()["notification_type"], "HOLIDAY");
    assert_eq!(response.data()["priority"], "HIGH");
    assert!(response.data()["scheduled_at"].is_null());
    assert!(response.data()["event_date"].is_string());
}

#[tokio::test]
async fn test_class_dispatch_over_two_channels() {
    let app = TestApp::new(class_of_ten());

    let id = app
        .create(
            "/api/notifications/class/7",
            json!({
                "title": "Sports day",
                "message": "Wear house colours on Thursday",
                "notification_type": "SPORTS_EVENT",
                "delivery_methods": ["EMAIL", "WHATSAPP"],
            }),
        )
        .await;
    app.run_dispatches().await;

    let deliveries = app.deliveries.find_by_notification(id).await.unwrap();
    assert_eq!(deliveries.len(), 20);
    assert_eq!(app.email.send_count(), 10);
    assert_eq!(app.whatsapp.send_count(), 10);
    assert_eq!(app.directory.calls(), vec!["class:7".to_string()]);

    let stats = app
        .request("GET", &format!("/api/notifications/{id}/statistics"), None)
        .await;
    assert_eq!(stats.data()["total"], 20);
    assert_eq!(stats.data()["sent"], 20);
}

#[tokio::test]
async fn test_section_route_scopes_directory_lookup() {
    let app = TestApp::new(class_of_ten());

    app.create(
        "/api/notifications/class/7/section/A",
        json!({
            "title": "Field trip",
            "message": "Bring a packed lunch",
            "notification_type": "ANNOUNCEMENT",
        }),
    )
    .await;
    app.run_dispatches().await;

    assert_eq!(app.directory.calls(), vec!["class:7:A".to_string()]);
}

#[tokio::test]
async fn test_directory_outage_fails_notification() {
    let app = TestApp::new(class_of_ten());
    app.directory.set_down(true);

    let id = app
        .create(
            "/api/notifications/circular",
            json!({ "title": "Fees", "message": "Term fees due", "delivery_methods": ["SMS"] }),
        )
        .await;
    app.run_dispatches().await;

    let response = app.request("GET", &format!("/api/notifications/{id}"), None).await;
    assert_eq!(response.data()["status"], "FAILED");
    assert!(
        response.data()["failure_reason"]
            .as_str()
            .unwrap()
            .starts_with("directory_unavailable")
    );
    assert_eq!(app.sms.send_count(), 0);
}

#[tokio::test]
async fn test_reprocessing_creates_no_duplicates() {
    let app = TestApp::new(class_of_ten());

    let id = app
        .create(
            "/api/notifications/send-to-all-parents",
            json!({
                "title": "Results",
                "message": "Report cards are out",
                "notification_type": "GENERAL",
                "delivery_methods": ["SMS", "IN_APP"],
            }),
        )
        .await;
    app.run_dispatches().await;
    let second = app.orchestrator.process(id).await.unwrap();

    assert!(matches!(second.outcome, DispatchOutcome::Skipped { .. }));
    assert_eq!(app.deliveries.find_by_notification(id).await.unwrap().len(), 20);
    assert_eq!(app.sms.send_count(), 10);
}

#[tokio::test]
async fn test_emergency_is_urgent() {
    let app = TestApp::new(vec![]);

    let response = app
        .request(
            "POST",
            "/api/notifications/emergency",
            Some(json!({ "title": "Closure", "message": "Flooding, school closed" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.data()["priority"], "URGENT");
    assert_eq!(response.data()["notification_type"], "EMERGENCY");
    assert_eq!(response.data()["delivery_methods"], json!(["IN_APP"]));
}

#[tokio::test]
async fn test_validation_errors_are_400() {
    let app = TestApp::new(vec![]);

    let empty_title = app
        .request(
            "POST",
            "/api/notifications/circular",
            Some(json!({ "title": "", "message": "body" })),
        )
        .await;
    assert_eq!(empty_title.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty_title.body["error"], "VALIDATION_ERROR");
    assert!(empty_title.body["details"]["title"].is_array());

    let push = app
        .request(
            "POST",
            "/api/notifications/circular",
            Some(json!({ "title": "t", "message": "m", "delivery_methods": ["PUSH"] })),
        )
        .await;
    assert_eq!(push.status, StatusCode::BAD_REQUEST);
    assert!(push.body["message"].as_str().unwrap().contains("not available"));

    let no_time = app
        .request(
            "POST",
            "/api/notifications/schedule",
            Some(json!({ "title": "t", "message": "m", "notification_type": "GENERAL" })),
        )
        .await;
    assert_eq!(no_time.status, StatusCode::BAD_REQUEST);

    let bad_class = app
        .request(
            "POST",
            "/api/notifications/class/seven",
            Some(json!({ "title": "t", "message": "m", "notification_type": "GENERAL" })),
        )
        .await;
    assert_eq!(bad_class.status, StatusCode::BAD_REQUEST);

    assert!(app.notifications.is_empty());
}

#[tokio::test]
async fn test_schedule_defers_then_cancel() {
    let app = TestApp::new(class_of_ten());

    let id = app
        .create(
            "/api/notifications/schedule",
            json!({
                "title": "Exam timetable",
                "message": "Finals begin next month",
                "notification_type": "EXAM_SCHEDULE",
                "scheduled_at": (Utc::now() + Duration::days(2)).to_rfc3339(),
            }),
        )
        .await;
    assert!(app.publisher.tasks().is_empty());

    let cancelled = app
        .request("PUT", &format!("/api/notifications/{id}/cancel"), None)
        .await;
    assert_eq!(cancelled.status, StatusCode::OK);
    assert_eq!(cancelled.data()["status"], "CANCELLED");

    let again = app
        .request("PUT", &format!("/api/notifications/{id}/cancel"), None)
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);

    let delete = app
        .request("DELETE", &format!("/api/notifications/{id}"), None)
        .await;
    assert_eq!(delete.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_delete_keeps_cancelled_row() {
    let app = TestApp::new(vec![]);
    let id = app
        .create(
            "/api/notifications/schedule",
            json!({
                "title": "Annual day",
                "message": "Rehearsals",
                "notification_type": "CULTURAL_EVENT",
                "scheduled_at": (Utc::now() + Duration::hours(3)).to_rfc3339(),
            }),
        )
        .await;

    let response = app
        .request("DELETE", &format!("/api/notifications/{id}"), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let fetched = app.request("GET", &format!("/api/notifications/{id}"), None).await;
    assert_eq!(fetched.data()["status"], "CANCELLED");
}
