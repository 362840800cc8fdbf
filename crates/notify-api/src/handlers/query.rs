//! Read-only notification handlers.

use axum::Json;
use axum::extract::{Path, Query, State};

use notify_core::types::{NotificationId, PageResponse};
use notify_entity::delivery::{Delivery, DeliveryMethod, DeliveryStatistics};
use notify_entity::notification::{
    Notification, NotificationStatus, NotificationType, TargetAudience,
};

use crate::dto::request::DeadLetterQuery;
use crate::dto::response::{ApiResponse, EnumOption};
use crate::error::ApiError;
use crate::extractors::{PaginationParams, parse_path};
use crate::state::AppState;

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> ApiResult<PageResponse<Notification>> {
    let page = state.queries.list(params.into_page_request()).await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// GET /api/notifications/{id}
pub async fn get_notification(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Notification> {
    let id: NotificationId = parse_path(&id, "notification id")?;
    Ok(Json(ApiResponse::ok(state.queries.get(id).await?)))
}

/// GET /api/notifications/type/{type}
pub async fn by_type(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> ApiResult<Vec<Notification>> {
    let notification_type: NotificationType = parse_path(&raw, "notification type")?;
    Ok(Json(ApiResponse::ok(
        state.queries.by_type(notification_type).await?,
    )))
}

/// GET /api/notifications/status/{status}
pub async fn by_status(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> ApiResult<Vec<Notification>> {
    let status: NotificationStatus = parse_path(&raw, "notification status")?;
    Ok(Json(ApiResponse::ok(state.queries.by_status(status).await?)))
}

/// GET /api/notifications/{id}/deliveries
pub async fn deliveries(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Delivery>> {
    let id: NotificationId = parse_path(&id, "notification id")?;
    Ok(Json(ApiResponse::ok(state.queries.deliveries(id).await?)))
}

/// GET /api/notifications/{id}/statistics
pub async fn statistics(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DeliveryStatistics> {
    let id: NotificationId = parse_path(&id, "notification id")?;
    Ok(Json(ApiResponse::ok(state.queries.statistics(id).await?)))
}

/// GET /api/notifications/unread/{recipient_id}
pub async fn unread(
    State(state): State<AppState>,
    Path(recipient_id): Path<String>,
) -> ApiResult<Vec<Delivery>> {
    let recipient_id: i64 = parse_path(&recipient_id, "recipient id")?;
    Ok(Json(ApiResponse::ok(state.queries.unread(recipient_id).await?)))
}

/// GET /api/notifications/dead-letters
pub async fn dead_letters(
    State(state): State<AppState>,
    Query(query): Query<DeadLetterQuery>,
) -> ApiResult<Vec<Delivery>> {
    Ok(Json(ApiResponse::ok(
        state.queries.dead_letters(query.limit()).await?,
    )))
}

/// GET /api/notifications/types
pub async fn notification_types() -> Json<ApiResponse<Vec<EnumOption>>> {
    let options = NotificationType::ALL
        .iter()
        .map(|t| EnumOption::new(t.as_str(), t.label()))
        .collect();
    Json(ApiResponse::ok(options))
}

/// GET /api/notifications/delivery-methods
pub async fn delivery_methods(State(state): State<AppState>) -> Json<ApiResponse<Vec<EnumOption>>> {
    let channels = state.orchestrator.channels();
    let options = DeliveryMethod::ALL
        .iter()
        .map(|m| EnumOption {
            available: Some(channels.supports(*m)),
            ..EnumOption::new(m.as_str(), m.label())
        })
        .collect();
    Json(ApiResponse::ok(options))
}

/// GET /api/notifications/target-audiences
pub async fn target_audiences() -> Json<ApiResponse<Vec<EnumOption>>> {
    let options = TargetAudience::ALL
        .iter()
        .map(|a| EnumOption::new(a.as_str(), a.label()))
        .collect();
    Json(ApiResponse::ok(options))
}
