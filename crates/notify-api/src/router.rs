//! Route definitions for the School Notify HTTP API.
//!
//! Notification routes are mounted under `/api/notifications`, the health
//! check under `/api/health`.

use axum::Router;
use axum::routing::{get, post, put};

use crate::handlers;
use crate::state::AppState;

/// Build the router with every route, without middleware.
pub fn build_router(state: AppState) -> Router {
    let notification_routes = Router::new()
        .merge(dispatch_routes())
        .merge(query_routes())
        .merge(mutation_routes())
        .merge(whatsapp_routes());

    let api_routes = Router::new()
        .nest("/notifications", notification_routes)
        .route("/health", get(handlers::health::health));

    Router::new().nest("/api", api_routes).with_state(state)
}

/// Create-and-dispatch endpoints
fn dispatch_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/send-to-all-parents",
            post(handlers::dispatch::send_to_all_parents),
        )
        .route("/holiday", post(handlers::dispatch::send_holiday))
        .route("/circular", post(handlers::dispatch::send_circular))
        .route("/emergency", post(handlers::dispatch::send_emergency))
        .route("/class/{class_id}", post(handlers::dispatch::send_to_class))
        .route(
            "/class/{class_id}/section/{section}",
            post(handlers::dispatch::send_to_class_section),
        )
        .route("/schedule", post(handlers::dispatch::schedule))
}

/// Listing, lookup, statistics and enum endpoints
fn query_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::query::list_notifications))
        .route("/types", get(handlers::query::notification_types))
        .route("/delivery-methods", get(handlers::query::delivery_methods))
        .route("/target-audiences", get(handlers::query::target_audiences))
        .route("/dead-letters", get(handlers::query::dead_letters))
        .route("/type/{notification_type}", get(handlers::query::by_type))
        .route("/status/{status}", get(handlers::query::by_status))
        .route("/unread/{recipient_id}", get(handlers::query::unread))
        .route(
            "/{id}",
            get(handlers::query::get_notification).delete(handlers::mutation::delete),
        )
        .route("/{id}/deliveries", get(handlers::query::deliveries))
        .route("/{id}/statistics", get(handlers::query::statistics))
}

/// Read receipts, cancellation and dead-letter requeue
fn mutation_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}/read/{recipient_id}",
            put(handlers::mutation::mark_read),
        )
        .route("/{id}/cancel", put(handlers::mutation::cancel))
        .route(
            "/deliveries/{delivery_id}/requeue",
            post(handlers::mutation::requeue),
        )
        .route(
            "/dead-letters/requeue",
            post(handlers::mutation::requeue_all),
        )
}

/// Direct WhatsApp sends
fn whatsapp_routes() -> Router<AppState> {
    Router::new()
        .route("/whatsapp", post(handlers::whatsapp::send_message))
        .route("/whatsapp/template", post(handlers::whatsapp::send_template))
        .route("/whatsapp/media", post(handlers::whatsapp::send_media))
        .route(
            "/whatsapp/interactive",
            post(handlers::whatsapp::send_interactive),
        )
        .route("/whatsapp/bulk", post(handlers::whatsapp::send_bulk))
}
