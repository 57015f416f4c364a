//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, ErrorKind};
use reservation::ReservationError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request (bad id, bad amount) caught before any operation ran.
    BadRequest(String),
    NotFound(String),
    /// Failure reported by the engine.
    Reservation(ReservationError),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::BadRequest(_) => ErrorKind::Validation,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::Reservation(err) => err.kind(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = status_for(kind);
        let message = match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => msg,
            ApiError::Reservation(err) => err.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(error = %message, %kind, "request failed");
        }

        let body = serde_json::json!({ "error": message, "kind": kind.as_str() });
        (status, axum::Json(body)).into_response()
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidState | ErrorKind::ResourceUnavailable | ErrorKind::TokenAlreadyUsed => {
            StatusCode::CONFLICT
        }
        ErrorKind::TokenExpired => StatusCode::GONE,
        ErrorKind::DependencyFailure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<ReservationError> for ApiError {
    fn from(err: ReservationError) -> Self {
        ApiError::Reservation(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Reservation(err.into())
    }
}
