//! REST API error types
//!
//! Every failure leaves the daemon as `{"error": {"code", "message"}}` with
//! a status derived from the code. Messages never carry source locations;
//! those go to the log.

use sv_core::SupervisorError;

use std::panic::Location;

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use error_location::ErrorLocation;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// JSON error response body
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

/// Inner error body with code and message
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    /// Machine-readable error code (e.g., "NOT_FOUND", "ACTION_NOT_ALLOWED")
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

/// API errors with associated HTTP status codes
#[derive(Debug, Error)]
pub enum ApiError {
    /// Server path not registered (404)
    #[error("Resource not found: {message} {location}")]
    NotFound {
        message: String,
        location: ErrorLocation,
    },

    /// Request malformed or path unusable (400)
    #[error("Bad request [{code}]: {message} {location}")]
    BadRequest {
        code: &'static str,
        message: String,
        location: ErrorLocation,
    },

    /// Action conflicts with the current state (409)
    #[error("Conflict [{code}]: {message} {location}")]
    Conflict {
        code: &'static str,
        message: String,
        location: ErrorLocation,
    },

    /// Persisted PID could not be adopted (422)
    #[error("Unprocessable [{code}]: {message} {location}")]
    Unprocessable {
        code: &'static str,
        message: String,
        location: ErrorLocation,
    },

    /// Supervisor or daemon failure (500)
    #[error("Internal error [{code}]: {message} {location}")]
    Internal {
        code: &'static str,
        message: String,
        location: ErrorLocation,
    },
}

impl ApiError {
    #[track_caller]
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            code,
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal {
            code: "INTERNAL_ERROR",
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}", self);
        } else {
            warn!("{}", self);
        }

        let body = match self {
            ApiError::NotFound { message, .. } => ApiErrorBody {
                code: "NOT_FOUND".into(),
                message,
            },
            ApiError::BadRequest { code, message, .. }
            | ApiError::Conflict { code, message, .. }
            | ApiError::Unprocessable { code, message, .. }
            | ApiError::Internal { code, message, .. } => ApiErrorBody {
                code: code.into(),
                message,
            },
        };

        (status, Json(ApiErrorResponse { error: body })).into_response()
    }
}

/// Map supervisor errors by their stable code
impl From<SupervisorError> for ApiError {
    #[track_caller]
    fn from(e: SupervisorError) -> Self {
        let location = ErrorLocation::from(Location::caller());
        let code = e.error_code();
        let message = e.summary();

        match code {
            "NOT_FOUND" => ApiError::NotFound { message, location },
            "NOT_INITIALIZED" | "INVALID_PATH" => ApiError::BadRequest {
                code,
                message,
                location,
            },
            "ACTION_NOT_ALLOWED"
            | "ALREADY_REGISTERED"
            | "ALREADY_INITIALIZED"
            | "ALREADY_RUNNING"
            | "NOT_RUNNING" => {
                ApiError::Conflict {
                    code,
                    message,
                    location,
                }
            }
            "ADOPTION_REJECTED" => ApiError::Unprocessable {
                code,
                message,
                location,
            },
            _ => {
                // Keep the located form for the log
                error!("Supervisor error: {}", e);
                ApiError::Internal {
                    code,
                    message,
                    location,
                }
            }
        }
    }
}

/// A panicked or cancelled action task
impl From<tokio::task::JoinError> for ApiError {
    #[track_caller]
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::internal(format!("server action did not complete: {e}"))
    }
}

impl From<JsonRejection> for ApiError {
    #[track_caller]
    fn from(e: JsonRejection) -> Self {
        ApiError::bad_request("BAD_REQUEST", e.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    #[track_caller]
    fn from(e: QueryRejection) -> Self {
        ApiError::bad_request("BAD_REQUEST", e.body_text())
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
