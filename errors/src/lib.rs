//! # Innkeep Errors
//!
//! Error handling for the Innkeep reservation system.
//!
//! Every fallible core operation returns a [`ReservationError`], which
//! classifies into a stable [`ErrorKind`] consumed by the HTTP layer.
//! Collaborator faults ([`StoreError`], [`NotifyError`]) are mapped at the
//! core boundary and never escape raw.

use serde::Serialize;
use thiserror::Error;

/// Stable classification of a failure, independent of the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Unauthorized,
    InvalidInput,
    NotFound,
    Conflict,
    Internal
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidInput => "INVALID_INPUT",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::Internal => "INTERNAL"
        };
        write!(f, "{s}")
    }
}

/// Reservation lifecycle errors
#[derive(Debug, Error)]
pub enum ReservationError {
    #[error("Unauthorized access: {reason}")]
    Unauthorized { reason: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    #[error("Room is not available: {room_id}")]
    RoomUnavailable { room_id: i64 },

    #[error("Service not found: ID = {service_id}")]
    ServiceNotFound { service_id: i64 },

    #[error("Reservation is not in PENDING status: {current}")]
    InvalidStatus { current: String },

    #[error("Internal error: {reason}")]
    Internal { reason: String }
}

impl ReservationError {
    /// The stable kind the presentation layer maps to a status code.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::NotFound { .. } | Self::ServiceNotFound { .. } => ErrorKind::NotFound,
            Self::RoomUnavailable { .. } | Self::InvalidStatus { .. } => ErrorKind::Conflict,
            Self::Internal { .. } => ErrorKind::Internal
        }
    }

    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            resource: resource.to_string(),
            id: id.to_string()
        }
    }
}

impl From<StoreError> for ReservationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound {
                resource: entity,
                id
            },
            other => {
                tracing::error!(error = %other, "store failure reached the core");
                Self::Internal {
                    reason: other.to_string()
                }
            }
        }
    }
}

/// Storage backend errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection to {backend} failed: {reason}")]
    Connection { backend: String, reason: String },

    #[error("Query on {backend} failed: {reason}")]
    Query { backend: String, reason: String },

    #[error("Serialization error: {reason}")]
    Serialization { reason: String },

    #[error("Not found on {entity}: {id}")]
    NotFound { entity: String, id: String }
}

/// Notification transport errors
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification transport failed: {reason}")]
    Transport { reason: String },

    #[error("Invalid recipient address: {address}")]
    InvalidAddress { address: String }
}
