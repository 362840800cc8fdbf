//! Typed path parameter helpers.

use std::str::FromStr;

use notify_core::error::AppError;
use notify_service::orchestrator::request::MAX_SECTION_LEN;

/// Parses a path segment into an id or enum, naming the parameter on failure.
///
/// Enum parse errors already carry the accepted values, so they are passed
/// through unchanged.
pub fn parse_path<T>(raw: &str, what: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Into<PathError>,
{
    raw.parse::<T>().map_err(|e| match e.into() {
        PathError::App(err) => err,
        PathError::Other(reason) => AppError::validation(format!("Invalid {what} '{raw}': {reason}")),
    })
}

/// Trims a class section segment and checks it fits the section column.
pub fn parse_section(raw: &str) -> Result<String, AppError> {
    let section = raw.trim();
    if section.is_empty() || section.chars().count() > MAX_SECTION_LEN {
        return Err(AppError::validation(format!(
            "Section must be between 1 and {MAX_SECTION_LEN} characters"
        )));
    }
    Ok(section.to_string())
}

/// Failure from parsing a path segment.
#[derive(Debug)]
pub enum PathError {
    App(AppError),
    Other(String),
}

impl From<AppError> for PathError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl From<uuid::Error> for PathError {
    fn from(err: uuid::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<std::num::ParseIntError> for PathError {
    fn from(err: std::num::ParseIntError) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify_core::error::ErrorKind;
    use notify_core::types::NotificationId;
    use notify_entity::notification::NotificationType;

    #[test]
    fn test_parses_ids_and_enums() {
        let id = NotificationId::new();
        assert_eq!(parse_path::<NotificationId>(&id.to_string(), "notification id").unwrap(), id);
        assert_eq!(
            parse_path::<NotificationType>("holiday", "notification type").unwrap(),
            NotificationType::Holiday
        );
        assert_eq!(parse_path::<i64>("42", "recipient id").unwrap(), 42);
    }

    #[test]
    fn test_bad_segment_is_validation_error() {
        let err = parse_path::<NotificationId>("nope", "notification id").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.starts_with("Invalid notification id 'nope'"));

        let err = parse_path::<NotificationType>("party", "notification type").unwrap_err();
        assert!(err.message.contains("Expected one of"));
    }

    #[test]
    fn test_section_segment() {
        assert_eq!(parse_section(" B ").unwrap(), "B");
        assert_eq!(parse_section("   ").unwrap_err().kind, ErrorKind::Validation);
        assert_eq!(
            parse_section("ABCDEFGHIJKLMNOP").unwrap_err().kind,
            ErrorKind::Validation
        );
    }
}
