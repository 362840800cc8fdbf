//! Worker runner: the main loop that pulls dispatch tasks and executes them.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, watch};

use notify_core::config::WorkerConfig;

use crate::executor::{DispatchExecutor, JobExecutionError};
use crate::queue::{DispatchReceiver, QueuedTask};

/// Pool of dispatch workers fed by the dispatch queue
#[derive(Debug)]
pub struct WorkerRunner {
    /// Consumer side of the dispatch queue
    receiver: DispatchReceiver,
    /// Executes each task
    executor: Arc<DispatchExecutor>,
    /// Worker configuration
    config: WorkerConfig,
}

impl WorkerRunner {
    /// Create a new worker runner
    pub fn new(receiver: DispatchReceiver, executor: Arc<DispatchExecutor>, config: WorkerConfig) -> Self {
        Self {
            receiver,
            executor,
            config,
        }
    }

    /// Run until the cancel signal is received, then wait (bounded) for
    /// in-flight tasks to finish
    pub async fn run(mut self, mut cancel: watch::Receiver<bool>) {
        let concurrency = self.config.concurrency.max(1);
        tracing::info!(
            concurrency,
            queue_capacity = self.config.queue_capacity,
            "Dispatch worker started"
        );

        let semaphore = Arc::new(Semaphore::new(concurrency));

        loop {
            let permit = tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        tracing::info!("Dispatch worker received shutdown signal");
                        break;
                    }
                    continue;
                }
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(p) => p,
                    Err(_) => break,
                },
            };

            let queued = tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        tracing::info!("Dispatch worker shutting down");
                        break;
                    }
                    continue;
                }
                queued = self.receiver.recv() => match queued {
                    Some(q) => q,
                    None => {
                        tracing::info!("Dispatch queue closed");
                        break;
                    }
                },
            };

            let executor = Arc::clone(&self.executor);
            tokio::spawn(async move {
                let _permit = permit;
                execute(&executor, queued).await;
            });
        }

        self.receiver.close();
        tracing::info!("Dispatch worker waiting for in-flight tasks to complete...");

        let grace = Duration::from_secs(self.config.shutdown_grace_seconds);
        if tokio::time::timeout(grace, semaphore.acquire_many(concurrency as u32))
            .await
            .is_err()
        {
            tracing::warn!(
                grace_seconds = self.config.shutdown_grace_seconds,
                "Shutdown grace period elapsed with dispatches still running"
            );
        }

        tracing::info!("Dispatch worker shut down complete");
    }
}

async fn execute(executor: &DispatchExecutor, queued: QueuedTask) {
    let notification_id = queued.task.notification_id;
    match executor.execute(&queued.task).await {
        Ok(summary) => {
            tracing::info!(
                notification_id = %notification_id,
                outcome = ?summary.outcome,
                deliveries = summary.deliveries,
                failed = summary.failed,
                "Dispatch completed"
            );
        }
        Err(JobExecutionError::Transient(msg)) => {
            tracing::warn!(
                notification_id = %notification_id,
                error = %msg,
                "Dispatch failed (transient); left for the promoter"
            );
        }
        Err(JobExecutionError::Permanent(msg)) => {
            tracing::error!(notification_id = %notification_id, error = %msg, "Dispatch failed permanently");
        }
        Err(JobExecutionError::Internal(err)) => {
            tracing::error!(notification_id = %notification_id, error = %err, "Dispatch internal error");
        }
    }
}
