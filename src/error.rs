use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::upstream::{AuthError, UpstreamError};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Playback provider or token endpoint is unavailable.
    #[error("playback provider unavailable")]
    Upstream(#[source] UpstreamError),
    /// Credentials were refused.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<UpstreamError> for ServiceError {
    fn from(err: UpstreamError) -> Self {
        ServiceError::Upstream(err)
    }
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::SignedOut | AuthError::Rejected { .. } => {
                ServiceError::Unauthorized(err.to_string())
            }
            AuthError::Transport { .. } | AuthError::Decode { .. } => {
                ServiceError::Upstream(err.into())
            }
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(err: ValidationErrors) -> Self {
        ServiceError::InvalidInput(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Upstream(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode as UpstreamStatus;

    use super::*;

    #[test]
    fn auth_failures_map_to_unauthorized() {
        let err: ServiceError = AuthError::Rejected {
            status: UpstreamStatus::BAD_REQUEST,
        }
        .into();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        let err: ServiceError = AuthError::SignedOut.into();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[test]
    fn service_errors_pick_http_status() {
        let cases = [
            (
                ServiceError::InvalidInput("bad sub".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::Unauthorized("nope".into()),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ServiceError::Upstream(UpstreamError::NotFound),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, status) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), status);
        }
    }
}
