//! Application builder: wires router, middleware, services and background
//! workers into a running server.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware as axum_middleware;
use tokio::sync::watch;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use notify_channel::{ChannelRegistry, WhatsAppSender};
use notify_core::config::{AppConfig, ServerConfig};
use notify_core::error::AppError;
use notify_database::{
    DatabasePool, DeliveryStore, NotificationStore, PgDeliveryRepository, PgNotificationRepository,
};
use notify_service::{
    DispatchPublisher, HttpDirectoryClient, NotificationOrchestrator, NotificationQueryService,
    RecipientResolver,
};
use notify_worker::{
    CronScheduler, DispatchExecutor, DispatchQueue, RetrySweeper, ScheduledPromoter, WorkerRunner,
};

use crate::middleware::compression::build_compression_layer;
use crate::middleware::cors::build_cors_layer;
use crate::middleware::logging::request_logging;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState, server: &ServerConfig) -> Router {
    build_router(state)
        .layer(DefaultBodyLimit::max(server.body_limit_bytes))
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(build_compression_layer())
        .layer(build_cors_layer(&server.cors))
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(request_logging))
}

/// Runs the School Notify server with the given configuration and database pool.
pub async fn run_server(config: AppConfig, db_pool: DatabasePool) -> Result<(), AppError> {
    tracing::info!("Starting School Notify server...");

    // ── Step 1: Stores ───────────────────────────────────────────
    let notifications: Arc<dyn NotificationStore> =
        Arc::new(PgNotificationRepository::new(db_pool.pool().clone()));
    let deliveries: Arc<dyn DeliveryStore> =
        Arc::new(PgDeliveryRepository::new(db_pool.pool().clone()));

    // ── Step 2: Channels and directory ───────────────────────────
    let channels = Arc::new(
        ChannelRegistry::from_config(&config.channels)
            .map_err(|e| AppError::configuration(format!("Channel setup failed: {e}")))?,
    );
    let whatsapp = if config.channels.whatsapp.enabled {
        let sender = WhatsAppSender::new(
            config.channels.whatsapp.clone(),
            config.channels.country_code.clone(),
        )
        .map_err(|e| AppError::configuration(format!("WhatsApp setup failed: {e}")))?;
        Some(Arc::new(sender))
    } else {
        None
    };

    let directory = Arc::new(HttpDirectoryClient::new(&config.directory)?);
    let resolver = RecipientResolver::new(directory, config.channels.country_code.clone());

    // ── Step 3: Dispatch queue and services ──────────────────────
    let (queue, receiver) = DispatchQueue::new(config.worker.queue_capacity);
    let publisher: Arc<dyn DispatchPublisher> = Arc::new(queue);

    let orchestrator = Arc::new(NotificationOrchestrator::new(
        Arc::clone(&notifications),
        Arc::clone(&deliveries),
        resolver.clone(),
        Arc::clone(&channels),
        Arc::clone(&publisher),
    ));
    let queries = Arc::new(NotificationQueryService::new(
        Arc::clone(&notifications),
        Arc::clone(&deliveries),
    ));

    // ── Step 4: Shutdown channel & worker pool ───────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker_handle = if config.worker.enabled {
        let executor = Arc::new(DispatchExecutor::new(Arc::clone(&orchestrator)));
        let runner = WorkerRunner::new(receiver, executor, config.worker.clone());
        let worker_cancel = shutdown_rx.clone();
        Some(tokio::spawn(async move {
            runner.run(worker_cancel).await;
        }))
    } else {
        tracing::warn!("Dispatch worker disabled; notifications stay SCHEDULED until a worker runs");
        drop(receiver);
        None
    };

    // ── Step 5: Retry sweeper and promoter ───────────────────────
    let mut scheduler = if config.scheduler.enabled {
        let sweeper = Arc::new(RetrySweeper::new(
            Arc::clone(&notifications),
            Arc::clone(&deliveries),
            resolver,
            Arc::clone(&channels),
            config.scheduler.max_retries,
            config.scheduler.sweep_batch_size,
        ));
        let promoter = Arc::new(ScheduledPromoter::new(
            Arc::clone(&notifications),
            Arc::clone(&publisher),
            config.scheduler.stale_after_seconds,
        ));
        let scheduler = CronScheduler::new().await?;
        scheduler
            .register_default_tasks(&config.scheduler, sweeper, promoter)
            .await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        None
    };

    // ── Step 6: Build and start HTTP server ──────────────────────
    let app_state = AppState {
        config: Arc::new(config.clone()),
        db_pool: Some(db_pool.clone()),
        orchestrator,
        queries,
        whatsapp,
        started_at: Instant::now(),
    };

    let app = build_app(app_state, &config.server);
    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!(addr = %addr, "School Notify server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 7: Drain background work ────────────────────────────
    if let Some(scheduler) = scheduler.as_mut() {
        if let Err(e) = scheduler.shutdown().await {
            tracing::warn!(error = %e, "Scheduler shutdown failed");
        }
    }
    if let Some(handle) = worker_handle {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Dispatch worker task panicked");
        }
    }
    db_pool.close().await;

    tracing::info!("School Notify server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
