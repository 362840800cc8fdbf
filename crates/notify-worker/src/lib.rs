//! Background processing for School Notify.
//!
//! This crate provides:
//! - A bounded dispatch queue with in-flight de-duplication
//! - A worker runner that processes queued notifications concurrently
//! - The retry sweeper and scheduled-notification promoter
//! - A cron scheduler that runs the sweeper and promoter periodically

pub mod executor;
pub mod promoter;
pub mod queue;
pub mod runner;
pub mod scheduler;
pub mod sweeper;

pub use executor::{DispatchExecutor, JobExecutionError};
pub use promoter::{PromotionReport, ScheduledPromoter};
pub use queue::{DispatchQueue, DispatchReceiver, QueuedTask};
pub use runner::WorkerRunner;
pub use scheduler::CronScheduler;
pub use sweeper::{RetrySweeper, SweepReport};
