//! Reservation error types.

use common::AggregateId;
use domain::{DomainError, ErrorKind};
use thiserror::Error;

/// Errors that can occur during reservation operations.
#[derive(Debug, Error)]
pub enum ReservationError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Token issuance failed and the booking could not be cancelled either.
    /// The slot may still be held.
    #[error(
        "Reservation {booking_id} failed ({original}) and could not be rolled back: {compensation}"
    )]
    CompensationFailed {
        booking_id: AggregateId,
        original: Box<DomainError>,
        compensation: Box<DomainError>,
    },
}

impl ReservationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReservationError::Domain(err) => err.kind(),
            ReservationError::CompensationFailed { .. } => ErrorKind::DependencyFailure,
        }
    }
}

/// Convenience type alias for reservation results.
pub type Result<T> = std::result::Result<T, ReservationError>;
