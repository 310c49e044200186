//! Error types for the HTTP gateway.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response}
};
use errors::{ErrorKind, ReservationError};
use serde::Serialize;
use thiserror::Error;

/// Result type alias for gateway handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors surfaced by the gateway.
#[derive(Error, Debug)]
pub enum ApiError {
    /// A classified failure from the reservation core.
    #[error(transparent)]
    Core(#[from] ReservationError),

    /// Missing or malformed bearer token.
    #[error("Authentication failed: {0}")]
    Authentication(String)
}

impl ApiError {
    pub fn invalid_input(field: &str, reason: impl Into<String>) -> Self {
        Self::Core(ReservationError::InvalidInput {
            field: field.to_string(),
            reason: reason.into()
        })
    }

    fn kind(&self) -> ErrorKind {
        match self {
            Self::Core(err) => err.kind(),
            Self::Authentication(_) => ErrorKind::Unauthorized
        }
    }
}

/// Error response body for HTTP endpoints.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = status_for(kind);

        if kind == ErrorKind::Internal {
            tracing::error!(error = %self, "internal error");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            code: kind.to_string()
        };

        (status, Json(body)).into_response()
    }
}
