//! # API Error Types
//!
//! Unified error handling for the REST layer.
//!
//! Every endpoint returns a structured error body with a stable message
//! and code; internal detail stays in the logs, never in the response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use hoverfly_domain::{DomainError, FieldError};
use hoverfly_persistence::PersistenceError;

/// API-level errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Unknown id or an id owned by someone else; indistinguishable by
    /// design so existence never leaks.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("Upstream service failed: {0}")]
    Upstream(String),

    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn mission_not_found() -> Self {
        Self::NotFound("Mission")
    }

    pub fn threat_not_found() -> Self {
        Self::NotFound("Threat")
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get stable error code for the response body
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(fields) => Self::Validation(fields),
        }
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::Domain(domain) => domain.into(),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, detail = ?self, "request failed");
        }

        let mut error = serde_json::json!({
            "message": self.to_string(),
            "code": self.error_code(),
        });
        if let Self::Validation(fields) = &self {
            error["details"] = serde_json::json!(fields);
        }

        (status, axum::Json(serde_json::json!({ "error": error }))).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(
            ApiError::Validation(vec![]).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::mission_not_found().status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Upstream("timeout".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_detail_never_reaches_the_body() {
        let err = ApiError::Internal("connection pool exhausted at 10.0.0.3".into());
        assert_eq!(err.to_string(), "Internal server error");
    }
}
