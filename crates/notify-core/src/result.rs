//! Convenience result type alias for School Notify.

use crate::error::AppError;

/// A specialized `Result` type for School Notify operations.
pub type AppResult<T> = Result<T, AppError>;
