//! # notify-database
//!
//! PostgreSQL connection management, the store traits the service layer
//! depends on, and two implementations of each: sqlx repositories for
//! production and dashmap-backed stores for tests and local runs.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::{MemoryDeliveryStore, MemoryNotificationStore};
pub use repositories::{PgDeliveryRepository, PgNotificationRepository};
pub use store::{DeliveryStore, NotificationStore};
