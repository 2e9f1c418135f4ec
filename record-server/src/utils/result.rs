//! Unified Result Types

use crate::AppError;

/// Handler-level Result type
pub type AppResult<T> = Result<T, AppError>;
