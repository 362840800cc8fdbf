//! State-changing notification and delivery handlers.

use axum::Json;
use axum::extract::{Path, Query, State};

use notify_core::types::{DeliveryId, NotificationId};
use notify_entity::delivery::Delivery;
use notify_entity::notification::Notification;

use crate::dto::request::DeadLetterQuery;
use crate::dto::response::{ApiResponse, CountResponse, MessageResponse, RequeueAllResponse};
use crate::error::ApiError;
use crate::extractors::parse_path;
use crate::state::AppState;

/// PUT /api/notifications/{id}/read/{recipient_id}
pub async fn mark_read(
    State(state): State<AppState>,
    Path((id, recipient_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    let id: NotificationId = parse_path(&id, "notification id")?;
    let recipient_id: i64 = parse_path(&recipient_id, "recipient id")?;
    let count = state.queries.mark_read(id, recipient_id).await?;
    Ok(Json(ApiResponse::ok(CountResponse { count })))
}

/// PUT /api/notifications/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Notification>>, ApiError> {
    let id: NotificationId = parse_path(&id, "notification id")?;
    Ok(Json(ApiResponse::ok(state.orchestrator.cancel(id).await?)))
}

/// DELETE /api/notifications/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id: NotificationId = parse_path(&id, "notification id")?;
    state.orchestrator.delete(id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new(
        "Notification deleted",
    ))))
}

/// POST /api/notifications/deliveries/{delivery_id}/requeue
pub async fn requeue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Delivery>>, ApiError> {
    let id: DeliveryId = parse_path(&id, "delivery id")?;
    Ok(Json(ApiResponse::ok(state.queries.requeue(id).await?)))
}

/// POST /api/notifications/dead-letters/requeue
pub async fn requeue_all(
    State(state): State<AppState>,
    Query(query): Query<DeadLetterQuery>,
) -> Result<Json<ApiResponse<RequeueAllResponse>>, ApiError> {
    let requeued = state.queries.requeue_all(query.limit()).await?;
    Ok(Json(ApiResponse::ok(RequeueAllResponse { requeued })))
}
