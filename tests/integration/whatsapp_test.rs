//! Integration tests for the direct WhatsApp routes against a fake Graph API.

mod helpers;

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};

use helpers::TestApp;

type Captured = Arc<Mutex<Vec<(String, Value, bool)>>>;

/// Fake Graph API. Numbers ending in `0000` are rejected.
async fn spawn_graph_api() -> (String, Captured) {
    let captured: Captured = Arc::default();
    let app = Router::new()
        .route(
            "/{phone_id}/messages",
            post(
                |State(seen): State<Captured>,
                 Path(phone_id): Path<String>,
                 headers: HeaderMap,
                 Json(body): Json<Value>| async move {
                    let authed = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        == Some("Bearer EAAG-test-token");
                    let rejected = body["to"].as_str().is_some_and(|to| to.ends_with("0000"));
                    seen.lock().unwrap().push((phone_id, body, authed));
                    if rejected {
                        (
                            StatusCode::BAD_REQUEST,
                            Json(json!({ "error": { "message": "Recipient not on WhatsApp" } })),
                        )
                    } else {
                        (
                            StatusCode::OK,
                            Json(json!({ "messages": [{ "id": "wamid.TEST1" }] })),
                        )
                    }
                },
            ),
        )
        .with_state(captured.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    (format!("http://{addr}"), captured)
}

#[tokio::test]
async fn test_send_text() {
    let (url, captured) = spawn_graph_api().await;
    let app = TestApp::with_whatsapp_api(&url);

    let response = app
        .request(
            "POST",
            "/api/notifications/whatsapp",
            Some(json!({ "phone_number": "098765 43210", "message": "PTM on Saturday" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    assert_eq!(response.data()["message_id"], "wamid.TEST1");

    let seen = captured.lock().unwrap();
    let (phone_id, body, authed) = &seen[0];
    assert_eq!(phone_id, "1122334455");
    assert!(authed);
    assert_eq!(body["to"], "919876543210");
    assert_eq!(body["type"], "text");
    assert_eq!(body["text"]["body"], "PTM on Saturday");
}

#[tokio::test]
async fn test_send_template_uses_default_language() {
    let (url, captured) = spawn_graph_api().await;
    let app = TestApp::with_whatsapp_api(&url);

    let response = app
        .request(
            "POST",
            "/api/notifications/whatsapp/template",
            Some(json!({
                "phone_number": "9876543210",
                "template_name": "fee_reminder",
                "parameters": ["Asha", "15 July"],
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);

    let seen = captured.lock().unwrap();
    let body = &seen[0].1;
    assert_eq!(body["type"], "template");
    assert_eq!(body["template"]["name"], "fee_reminder");
    assert_eq!(body["template"]["language"]["code"], "en");
}

#[tokio::test]
async fn test_send_media_rejects_unknown_type() {
    let (url, captured) = spawn_graph_api().await;
    let app = TestApp::with_whatsapp_api(&url);

    let response = app
        .request(
            "POST",
            "/api/notifications/whatsapp/media",
            Some(json!({
                "phone_number": "9876543210",
                "media_type": "sticker",
                "media_url": "https://school.example/circular.pdf",
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(captured.lock().unwrap().is_empty());

    let response = app
        .request(
            "POST",
            "/api/notifications/whatsapp/media",
            Some(json!({
                "phone_number": "9876543210",
                "media_type": "document",
                "media_url": "https://school.example/circular.pdf",
                "caption": "Term circular",
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    assert_eq!(captured.lock().unwrap()[0].1["type"], "document");
}

#[tokio::test]
async fn test_provider_rejection_is_bad_gateway() {
    let (url, _) = spawn_graph_api().await;
    let app = TestApp::with_whatsapp_api(&url);

    let response = app
        .request(
            "POST",
            "/api/notifications/whatsapp",
            Some(json!({ "phone_number": "9876500000", "message": "hi" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(response.body["error"], "EXTERNAL_SERVICE_ERROR");
}

#[tokio::test]
async fn test_bulk_reports_per_number() {
    let (url, captured) = spawn_graph_api().await;
    let app = TestApp::with_whatsapp_api(&url);

    let response = app
        .request(
            "POST",
            "/api/notifications/whatsapp/bulk",
            Some(json!({
                "phone_numbers": ["9876543210", "9876500000", "12"],
                "message": "Holiday tomorrow",
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let data = response.data();
    assert_eq!(data["total"], 3);
    assert_eq!(data["sent"], 1);
    assert_eq!(data["failed"], 2);
    assert_eq!(data["results"]["9876543210"], true);
    assert_eq!(data["results"]["12"], false);
    assert_eq!(captured.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_disabled_channel_is_503() {
    let app = TestApp::new(vec![]);

    let response = app
        .request(
            "POST",
            "/api/notifications/whatsapp",
            Some(json!({ "phone_number": "9876543210", "message": "hi" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
}
