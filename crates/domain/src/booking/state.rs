//! Booking lifecycle.

use serde::{Deserialize, Serialize};

/// Status of a booking.
///
/// ```text
/// Active ──┬──► Completed
///          └──► Cancelled
/// ```
/// Both end states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    #[default]
    Active,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Active)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Active => "ACTIVE",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
