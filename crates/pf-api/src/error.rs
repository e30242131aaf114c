//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Every error response is a flat JSON object whose `error` field is a
//! machine-readable code. Entitlement denials additionally carry the plan
//! that would unlock the export and the gate's reason, which the web client
//! shows in its upgrade prompt.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pf_entitlement::Plan;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Machine-readable error code (e.g. "BAD_REQUEST", "ENTITLEMENT_REQUIRED").
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Plan that unlocks the export. Entitlement denials only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_plan: Option<String>,
    /// Gate reason. Entitlement denials only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Application-level error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request body missing, malformed or semantically invalid (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The gate denied the export (403).
    #[error("entitlement required: {reason}")]
    EntitlementRequired { required_plan: Plan, reason: String },

    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status and machine-readable code.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::EntitlementRequired { .. } => (StatusCode::FORBIDDEN, "ENTITLEMENT_REQUIRED"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        let (required_plan, reason) = match self {
            Self::EntitlementRequired {
                required_plan,
                reason,
            } => (Some(required_plan.to_string()), Some(reason)),
            _ => (None, None),
        };

        let body = ErrorBody {
            error: code.to_string(),
            message,
            required_plan,
            reason,
        };

        (status, Json(body)).into_response()
    }
}
