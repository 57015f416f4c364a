//! Booking domain events.

use chrono::{DateTime, Utc};
use common::{AggregateId, UserId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::fee::Money;

/// Events that can occur on a booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum BookingEvent {
    BookingCreated(BookingCreatedData),

    /// Charges are final once this is recorded.
    BookingCompleted(BookingCompletedData),

    BookingCancelled(BookingCancelledData),
}

impl DomainEvent for BookingEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BookingEvent::BookingCreated(_) => "BookingCreated",
            BookingEvent::BookingCompleted(_) => "BookingCompleted",
            BookingEvent::BookingCancelled(_) => "BookingCancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCreatedData {
    pub booking_id: AggregateId,
    pub user_id: UserId,
    pub slot_id: AggregateId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,

    /// Rate resolved at creation; overstay is billed at the same rate.
    pub hourly_rate: Money,

    pub booking_amount: Money,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCompletedData {
    pub completed_at: DateTime<Utc>,
    pub penalty_applied: bool,

    /// Whole hours past the end time, rounded up.
    pub overstay_hours: i64,

    pub penalty_amount: Money,
    pub total_amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCancelledData {
    pub cancelled_at: DateTime<Utc>,
}
