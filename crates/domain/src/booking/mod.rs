//! Bookings: time-bounded claims by a user on a slot.

mod aggregate;
mod events;
mod ledger;
mod state;

pub use aggregate::Booking;
pub use events::{BookingCancelledData, BookingCompletedData, BookingCreatedData, BookingEvent};
pub use ledger::BookingLedger;
pub use state::BookingStatus;

use chrono::{DateTime, Utc};
use common::AggregateId;
use thiserror::Error;

use crate::error::{DomainError, ErrorKind};
use crate::fee::Money;

/// Errors that can occur during booking operations.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Booking not found: {0}")]
    NotFound(AggregateId),

    #[error("Invalid window: start {start} must be before end {end}")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Terminal bookings accept no further transitions.
    #[error("Cannot {action} booking {booking_id} in {status} status")]
    InvalidTransition {
        booking_id: AggregateId,
        status: BookingStatus,
        action: &'static str,
    },

    #[error("Charge at hourly rate {hourly_rate} exceeds the representable amount")]
    ChargeOverflow { hourly_rate: Money },

    #[error("Booking already created: {0}")]
    AlreadyCreated(AggregateId),

    /// The booking reached its end state but its slot stayed held.
    #[error("Booking {booking_id} ended but slot {slot_id} was not released: {source}")]
    SlotRelease {
        booking_id: AggregateId,
        slot_id: AggregateId,
        #[source]
        source: Box<DomainError>,
    },
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::NotFound(_) => ErrorKind::NotFound,
            BookingError::InvalidWindow { .. } | BookingError::ChargeOverflow { .. } => {
                ErrorKind::Validation
            }
            BookingError::InvalidTransition { .. } | BookingError::AlreadyCreated(_) => {
                ErrorKind::InvalidState
            }
            BookingError::SlotRelease { .. } => ErrorKind::DependencyFailure,
        }
    }
}
