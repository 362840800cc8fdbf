//! sqlx implementations of the store traits.

pub mod delivery;
pub mod notification;

pub use delivery::PgDeliveryRepository;
pub use notification::PgNotificationRepository;
