//! Response types for the Leave Engine API.
//!
//! This module defines the error response structures and maps every
//! [`EngineError`] onto an HTTP status and a stable error code.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::{BalanceSnapshot, EmployeeId, Period};

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// A 400 response.
    pub fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }

    /// A 401 response for a missing or malformed `x-actor-id` header.
    pub fn missing_actor() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: ApiError::with_details(
                "MISSING_ACTOR",
                "The acting employee is unknown",
                "Send the employee id in the x-actor-id header",
            ),
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<JsonRejection> for ApiErrorResponse {
    fn from(rejection: JsonRejection) -> Self {
        let error = match rejection {
            JsonRejection::JsonDataError(err) => {
                let body_text = err.body_text();
                if body_text.contains("missing field") {
                    ApiError::new("VALIDATION_ERROR", body_text)
                } else {
                    ApiError::malformed_json(body_text)
                }
            }
            JsonRejection::JsonSyntaxError(err) => {
                ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
            }
            JsonRejection::MissingJsonContentType(_) => {
                ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
            }
            _ => ApiError::malformed_json("Failed to parse request body"),
        };
        Self::bad_request(error)
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        let (status, error) = match error {
            EngineError::Validation { field, .. } => (
                StatusCode::BAD_REQUEST,
                ApiError::with_details("VALIDATION_ERROR", message, format!("field: {}", field)),
            ),
            EngineError::InsufficientBalance { period_id, .. } => (
                StatusCode::CONFLICT,
                ApiError::with_details(
                    "INSUFFICIENT_BALANCE",
                    message,
                    format!("period: {}", period_id),
                ),
            ),
            EngineError::NotFound { .. } => {
                (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", message))
            }
            EngineError::PermissionDenied { .. } => {
                (StatusCode::FORBIDDEN, ApiError::new("PERMISSION_DENIED", message))
            }
            EngineError::InvalidTransition { .. } => {
                (StatusCode::CONFLICT, ApiError::new("INVALID_TRANSITION", message))
            }
            EngineError::InvalidOrExpiredToken => (
                StatusCode::GONE,
                ApiError::with_details(
                    "INVALID_OR_EXPIRED_TOKEN",
                    message,
                    "The link was already used, replaced by a newer one, or has expired",
                ),
            ),
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("CONFIG_ERROR", "Configuration error", message),
            ),
            EngineError::Storage { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("STORAGE_ERROR", "Storage failure", message),
            ),
        };
        ApiErrorResponse { status, error }
    }
}

/// Body of `GET /employees/:id/balance`.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceResponse {
    /// The employee.
    pub employee_id: EmployeeId,
    /// Totals over every period.
    pub balance: BalanceSnapshot,
    /// Each period, oldest first.
    pub periods: Vec<Period>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError::new("TEST_ERROR", "Test message");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"code\":\"TEST_ERROR\""));
        assert!(json.contains("\"message\":\"Test message\""));
        assert!(!json.contains("details"));
    }

    #[test]
    fn test_engine_errors_map_to_statuses() {
        let cases = [
            (EngineError::validation("days", "zero"), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (
                EngineError::InsufficientBalance {
                    period_id: "p".to_string(),
                    requested: Decimal::new(5, 0),
                    outstanding: Decimal::new(1, 0),
                },
                StatusCode::CONFLICT,
                "INSUFFICIENT_BALANCE",
            ),
            (EngineError::not_found("request", "r"), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (EngineError::denied("e", "approve"), StatusCode::FORBIDDEN, "PERMISSION_DENIED"),
            (
                EngineError::InvalidTransition {
                    state: "approved".to_string(),
                    action: "cancel".to_string(),
                },
                StatusCode::CONFLICT,
                "INVALID_TRANSITION",
            ),
            (EngineError::InvalidOrExpiredToken, StatusCode::GONE, "INVALID_OR_EXPIRED_TOKEN"),
            (EngineError::poisoned(), StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
        ];
        for (engine_error, status, code) in cases {
            let response: ApiErrorResponse = engine_error.into();
            assert_eq!(response.status, status);
            assert_eq!(response.error.code, code);
        }
    }

    #[test]
    fn test_validation_error_names_the_field() {
        let response: ApiErrorResponse = EngineError::validation("end_date", "before start").into();
        assert_eq!(response.error.message, "Invalid end_date: before start");
        assert_eq!(response.error.details.as_deref(), Some("field: end_date"));
    }
}
