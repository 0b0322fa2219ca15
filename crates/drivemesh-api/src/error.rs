//! The `{ "error": { "code", "message", "details" } }` response envelope.
//!
//! `CoreError` already carries a code/status taxonomy; this type exists
//! only to bridge it into `axum::response::IntoResponse` and to cover the
//! handful of failure modes that have no `CoreError` equivalent because
//! they happen before a use case is ever called (malformed multipart
//! bodies, bad Range headers, oversized payloads).

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use drivemesh_core::domain::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("malformed multipart body: {0}")]
    Multipart(String),

    #[error("invalid range header: {0}")]
    InvalidRange(String),

    #[error("audit already running")]
    AuditRunning,
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Core(CoreError::Internal(err.to_string()))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Core(CoreError::Internal(err.to_string()))
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::Multipart(err.to_string())
    }
}

impl From<drivemesh_audit::AuditAlreadyRunning> for ApiError {
    fn from(_: drivemesh_audit::AuditAlreadyRunning) -> Self {
        ApiError::AuditRunning
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::Core(e) => e.code(),
            ApiError::Multipart(_) => "INVALID_REQUEST",
            ApiError::InvalidRange(_) => "INVALID_REQUEST",
            ApiError::AuditRunning => "SERVICE_UNAVAILABLE",
        }
    }

    fn status(&self) -> StatusCode {
        let raw = match self {
            ApiError::Core(e) => e.http_status(),
            ApiError::Multipart(_) | ApiError::InvalidRange(_) => 400,
            ApiError::AuditRunning => 503,
        };
        StatusCode::from_u16(raw).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status().is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                message: self.to_string(),
                details: None,
            },
        };
        (self.status(), Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
