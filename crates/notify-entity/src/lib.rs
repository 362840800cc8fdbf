//! # notify-entity
//!
//! Domain entity models for School Notify. Every struct in this crate
//! represents a database table row or a domain value object. All entities
//! derive `Debug`, `Clone`, `Serialize`, `Deserialize`, and database
//! entities additionally derive `sqlx::FromRow`.

pub mod delivery;
pub mod notification;
pub mod recipient;

use notify_core::AppError;

/// Parse an enum from its wire name, ignoring ASCII case and accepting
/// `-` in place of `_`.
pub(crate) fn parse_variant<T: Copy>(
    input: &str,
    all: &[T],
    name_of: impl Fn(&T) -> &'static str,
    what: &str,
) -> Result<T, AppError> {
    let wanted = input.trim().replace('-', "_");
    all.iter()
        .copied()
        .find(|v| name_of(v).eq_ignore_ascii_case(&wanted))
        .ok_or_else(|| {
            let expected: Vec<&str> = all.iter().map(&name_of).collect();
            AppError::validation(format!(
                "Invalid {what}: '{input}'. Expected one of: {}",
                expected.join(", ")
            ))
        })
}
