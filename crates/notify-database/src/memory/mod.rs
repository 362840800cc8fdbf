//! In-memory store implementations backed by `dashmap`.
//!
//! Used by the test suites and by local runs without PostgreSQL. State is
//! lost when the process exits.

pub mod delivery;
pub mod notification;

pub use delivery::MemoryDeliveryStore;
pub use notification::MemoryNotificationStore;
