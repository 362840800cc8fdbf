//! Delivery domain entities.

pub mod model;
pub mod stats;
pub mod status;

pub use model::{CreateDelivery, Delivery};
pub use stats::DeliveryStatistics;
pub use status::{DeliveryMethod, DeliveryStatus};
