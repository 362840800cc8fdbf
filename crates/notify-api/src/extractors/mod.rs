//! Custom Axum extractors.

pub mod json;
pub mod pagination;
pub mod path;

pub use json::ValidatedJson;
pub use pagination::PaginationParams;
pub use path::{parse_path, parse_section};
