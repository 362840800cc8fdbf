//! Handlers that create and dispatch notifications.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use notify_entity::notification::Notification;
use notify_service::DispatchRequest;

use crate::dto::request::{AnnouncementRequest, HolidayRequest, NotificationRequest};
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::{ValidatedJson, parse_path, parse_section};
use crate::state::AppState;

type Created = (StatusCode, Json<ApiResponse<Notification>>);

fn created(notification: Notification) -> Created {
    (StatusCode::CREATED, Json(ApiResponse::ok(notification)))
}

/// POST /api/notifications/send-to-all-parents
pub async fn send_to_all_parents(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<NotificationRequest>,
) -> Result<Created, ApiError> {
    let notification = state
        .orchestrator
        .send_to_all_parents(DispatchRequest::from(req))
        .await?;
    Ok(created(notification))
}

/// POST /api/notifications/holiday
pub async fn send_holiday(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<HolidayRequest>,
) -> Result<Created, ApiError> {
    let notification = state
        .orchestrator
        .send_holiday(req.title, req.message, req.holiday_date, req.delivery_methods)
        .await?;
    Ok(created(notification))
}

/// POST /api/notifications/circular
pub async fn send_circular(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<AnnouncementRequest>,
) -> Result<Created, ApiError> {
    let notification = state
        .orchestrator
        .send_circular(req.title, req.message, req.delivery_methods)
        .await?;
    Ok(created(notification))
}

/// POST /api/notifications/emergency
pub async fn send_emergency(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<AnnouncementRequest>,
) -> Result<Created, ApiError> {
    let notification = state
        .orchestrator
        .send_emergency(req.title, req.message, req.delivery_methods)
        .await?;
    Ok(created(notification))
}

/// POST /api/notifications/class/{class_id}
pub async fn send_to_class(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
    ValidatedJson(req): ValidatedJson<NotificationRequest>,
) -> Result<Created, ApiError> {
    let class_id: i64 = parse_path(&class_id, "class id")?;
    let notification = state
        .orchestrator
        .send_to_class(class_id, DispatchRequest::from(req))
        .await?;
    Ok(created(notification))
}

/// POST /api/notifications/class/{class_id}/section/{section}
pub async fn send_to_class_section(
    State(state): State<AppState>,
    Path((class_id, section)): Path<(String, String)>,
    ValidatedJson(req): ValidatedJson<NotificationRequest>,
) -> Result<Created, ApiError> {
    let class_id: i64 = parse_path(&class_id, "class id")?;
    let section = parse_section(&section)?;
    let notification = state
        .orchestrator
        .send_to_class_section(class_id, section, DispatchRequest::from(req))
        .await?;
    Ok(created(notification))
}

/// POST /api/notifications/schedule
pub async fn schedule(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<NotificationRequest>,
) -> Result<Created, ApiError> {
    let notification = state
        .orchestrator
        .schedule(DispatchRequest::from(req))
        .await?;
    Ok(created(notification))
}
