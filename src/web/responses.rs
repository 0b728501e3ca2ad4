//! HTTP response types and utilities
//!
//! Standard error envelope and the mapping from [`AppError`] to status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{error, warn};

use crate::errors::{AppError, UpstreamError};

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    /// Whether the operation was successful
    pub success: bool,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// Response timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            details: None,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn error(message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message),
            details: None,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn error_with_details(message: String, details: Value) -> ApiResponse<()> {
        ApiResponse {
            details: Some(details),
            ..Self::error(message)
        }
    }
}

const GENERIC_INTERNAL_ERROR: &str = "Internal server error";

/// Status code and message for an upstream failure
fn upstream_status(error: &UpstreamError) -> (StatusCode, String) {
    match error {
        UpstreamError::Status { status, .. } => {
            let code = StatusCode::from_u16(*status)
                .ok()
                .filter(|code| code.is_client_error() || code.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY);
            (code, error.to_string())
        }
        UpstreamError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, error.to_string()),
        UpstreamError::Transport { .. } | UpstreamError::Redirect { .. } => {
            (StatusCode::BAD_GATEWAY, error.to_string())
        }
        UpstreamError::Decode { upstream, .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to decode {upstream} response"),
        ),
    }
}

/// Convert AppError to appropriate HTTP response
pub fn handle_error(error: AppError) -> Response {
    let (status, message, details) = match &error {
        AppError::Upstream(upstream) => {
            let (status, message) = upstream_status(upstream);
            (status, message, None)
        }
        AppError::BadUpstream { .. } => (StatusCode::BAD_GATEWAY, error.to_string(), None),
        AppError::NotFound { resource, id } => (
            StatusCode::NOT_FOUND,
            format!("{resource} with id '{id}' not found"),
            None,
        ),
        AppError::ManifestUnavailable { attempts } => (
            StatusCode::BAD_GATEWAY,
            "Manifest could not be located by any upstream".to_string(),
            Some(json!({ "attempts": attempts })),
        ),
        AppError::Validation { message } => (StatusCode::BAD_REQUEST, message.clone(), None),
        AppError::Configuration { .. } | AppError::Internal { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            GENERIC_INTERNAL_ERROR.to_string(),
            None,
        ),
    };

    if status.is_server_error() {
        error!(status = status.as_u16(), "Request failed: {}", error);
    } else {
        warn!(status = status.as_u16(), "Request rejected: {}", error);
    }

    let body = match details {
        Some(details) => ApiResponse::<()>::error_with_details(message, details),
        None => ApiResponse::<()>::error(message),
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        handle_error(self)
    }
}
