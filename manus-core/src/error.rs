//! Error types for console entities

use thiserror::Error;

/// Validation errors raised before anything is sent to the backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: &'static str },

    #[error("Invalid value for {field}: {reason}")]
    OutOfRange { field: &'static str, reason: String },
}

pub type ValidationResult<T> = Result<T, ValidationError>;
