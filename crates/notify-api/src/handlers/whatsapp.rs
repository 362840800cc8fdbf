//! Direct WhatsApp sends that bypass notification persistence.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;

use notify_channel::{MediaType, WhatsAppSender};
use notify_core::error::AppError;

use crate::dto::request::{
    WhatsAppBulkRequest, WhatsAppInteractiveRequest, WhatsAppMediaRequest, WhatsAppMessageRequest,
    WhatsAppTemplateRequest,
};
use crate::dto::response::{ApiResponse, BulkSendResponse, WhatsAppSendResponse};
use crate::error::ApiError;
use crate::extractors::ValidatedJson;
use crate::state::AppState;

type SendResult = Result<Json<ApiResponse<WhatsAppSendResponse>>, ApiError>;

fn sender(state: &AppState) -> Result<Arc<WhatsAppSender>, ApiError> {
    state
        .whatsapp
        .clone()
        .ok_or_else(|| AppError::service_unavailable("WhatsApp channel is not enabled").into())
}

fn sent(phone_number: String, message_id: String) -> Json<ApiResponse<WhatsAppSendResponse>> {
    Json(ApiResponse::ok(WhatsAppSendResponse {
        phone_number,
        message_id,
    }))
}

/// POST /api/notifications/whatsapp
pub async fn send_message(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<WhatsAppMessageRequest>,
) -> SendResult {
    let message_id = sender(&state)?
        .deliver_text(&req.phone_number, &req.message)
        .await?;
    Ok(sent(req.phone_number, message_id))
}

/// POST /api/notifications/whatsapp/template
pub async fn send_template(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<WhatsAppTemplateRequest>,
) -> SendResult {
    let message_id = sender(&state)?
        .deliver_template(
            &req.phone_number,
            &req.template_name,
            req.language.as_deref(),
            &req.parameters,
        )
        .await?;
    Ok(sent(req.phone_number, message_id))
}

/// POST /api/notifications/whatsapp/media
pub async fn send_media(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<WhatsAppMediaRequest>,
) -> SendResult {
    let whatsapp = sender(&state)?;
    let media_type: MediaType = req.media_type.parse()?;
    let message_id = whatsapp
        .deliver_media(
            &req.phone_number,
            media_type,
            &req.media_url,
            req.caption.as_deref(),
        )
        .await?;
    Ok(sent(req.phone_number, message_id))
}

/// POST /api/notifications/whatsapp/interactive
pub async fn send_interactive(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<WhatsAppInteractiveRequest>,
) -> SendResult {
    let whatsapp = sender(&state)?;
    let phone_number = req.phone_number.clone();
    let message_id = whatsapp
        .deliver_interactive(&phone_number, &req.into())
        .await?;
    Ok(sent(phone_number, message_id))
}

/// POST /api/notifications/whatsapp/bulk
///
/// Always 200; per-number failures are reported in the body.
pub async fn send_bulk(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<WhatsAppBulkRequest>,
) -> Result<Json<ApiResponse<BulkSendResponse>>, ApiError> {
    let whatsapp = sender(&state)?;
    let batch: BTreeMap<String, String> = req
        .phone_numbers
        .into_iter()
        .map(|number| (number, req.message.clone()))
        .collect();
    let results = whatsapp.send_bulk(&batch).await;
    Ok(Json(ApiResponse::ok(BulkSendResponse::from(results))))
}
