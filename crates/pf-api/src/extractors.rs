//! # Custom Extractors & Validation
//!
//! The [`Validate`] trait for request DTOs and helpers that map body
//! rejections to [`AppError::BadRequest`].

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Request types with rules beyond what serde checks.
pub trait Validate {
    /// Returns an error message on failure.
    fn validate(&self) -> Result<(), String>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and run [`Validate`] on it.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::BadRequest)?;
    Ok(value)
}
