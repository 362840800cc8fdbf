//! Shared application state passed to all handlers.

use std::sync::Arc;
use std::time::Instant;

use notify_channel::WhatsAppSender;
use notify_core::config::AppConfig;
use notify_database::DatabasePool;
use notify_service::{NotificationOrchestrator, NotificationQueryService};

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Database pool. `None` when running over in-memory stores.
    pub db_pool: Option<DatabasePool>,

    // ── Services ─────────────────────────────────────────────
    pub orchestrator: Arc<NotificationOrchestrator>,
    pub queries: Arc<NotificationQueryService>,

    // ── Direct channels ──────────────────────────────────────
    /// WhatsApp sender for the direct-send routes, when enabled.
    pub whatsapp: Option<Arc<WhatsAppSender>>,

    /// Server start time, for uptime reporting.
    pub started_at: Instant,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("orchestrator", &self.orchestrator)
            .field("database", &self.db_pool.is_some())
            .field("whatsapp", &self.whatsapp.is_some())
            .finish()
    }
}
