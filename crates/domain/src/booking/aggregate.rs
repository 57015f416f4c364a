//! Booking aggregate implementation.

use chrono::{DateTime, Utc};
use common::{AggregateId, UserId};
use event_store::Version;

use crate::aggregate::Aggregate;
use crate::fee::{Money, ceil_hours};

use super::{
    BookingError, BookingEvent, BookingStatus,
    events::{BookingCancelledData, BookingCompletedData, BookingCreatedData},
};

/// A booking and its charges.
///
/// `booking_amount` is fixed at creation. Penalty fields are only set by
/// completion past the end time.
#[derive(Debug, Clone, Default)]
pub struct Booking {
    id: Option<AggregateId>,
    version: Version,
    user_id: UserId,
    slot_id: AggregateId,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    status: BookingStatus,
    hourly_rate: Money,
    booking_amount: Money,
    penalty_applied: bool,
    overstay_hours: i64,
    penalty_amount: Money,
    total_amount: Money,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Aggregate for Booking {
    type Event = BookingEvent;
    type Error = BookingError;

    fn aggregate_type() -> &'static str {
        "Booking"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            BookingEvent::BookingCreated(data) => {
                self.id = Some(data.booking_id);
                self.user_id = data.user_id;
                self.slot_id = data.slot_id;
                self.start_time = data.start_time;
                self.end_time = data.end_time;
                self.status = BookingStatus::Active;
                self.hourly_rate = data.hourly_rate;
                self.booking_amount = data.booking_amount;
                self.total_amount = data.booking_amount;
                self.created_at = data.created_at;
                self.updated_at = data.created_at;
            }
            BookingEvent::BookingCompleted(data) => {
                self.status = BookingStatus::Completed;
                self.penalty_applied = data.penalty_applied;
                self.overstay_hours = data.overstay_hours;
                self.penalty_amount = data.penalty_amount;
                self.total_amount = data.total_amount;
                self.updated_at = data.completed_at;
            }
            BookingEvent::BookingCancelled(data) => {
                self.status = BookingStatus::Cancelled;
                self.updated_at = data.cancelled_at;
            }
        }
    }
}

// Query methods
impl Booking {
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn slot_id(&self) -> AggregateId {
        self.slot_id
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn status(&self) -> BookingStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.id.is_some() && self.status.is_active()
    }

    /// Rate captured when the booking was made.
    pub fn hourly_rate(&self) -> Money {
        self.hourly_rate
    }

    pub fn booking_amount(&self) -> Money {
        self.booking_amount
    }

    pub fn penalty_applied(&self) -> bool {
        self.penalty_applied
    }

    pub fn overstay_hours(&self) -> i64 {
        self.overstay_hours
    }

    pub fn penalty_amount(&self) -> Money {
        self.penalty_amount
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

// Command methods (return events)
impl Booking {
    /// Rejects windows that do not end after they start.
    pub fn check_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), BookingError> {
        if start >= end {
            return Err(BookingError::InvalidWindow { start, end });
        }
        Ok(())
    }

    /// Amount billed for the window at `hourly_rate`.
    ///
    /// Rejects inverted windows and charges that do not fit in `Money`.
    pub fn charge_for(
        hourly_rate: Money,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Money, BookingError> {
        Self::check_window(start, end)?;
        hourly_rate
            .checked_multiply(ceil_hours(end - start))
            .ok_or(BookingError::ChargeOverflow { hourly_rate })
    }

    /// Records a new active booking billed at `hourly_rate`.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &self,
        booking_id: AggregateId,
        user_id: UserId,
        slot_id: AggregateId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        hourly_rate: Money,
        now: DateTime<Utc>,
    ) -> Result<Vec<BookingEvent>, BookingError> {
        if self.id.is_some() {
            return Err(BookingError::AlreadyCreated(booking_id));
        }
        let booking_amount = Self::charge_for(hourly_rate, start, end)?;
        Ok(vec![BookingEvent::BookingCreated(BookingCreatedData {
            booking_id,
            user_id,
            slot_id,
            start_time: start,
            end_time: end,
            hourly_rate,
            booking_amount,
            created_at: now,
        })])
    }

    /// Finalizes the charges.
    ///
    /// Completing after the end time adds `default_penalty` plus every
    /// started overstay hour at the booking's rate.
    pub fn complete(
        &self,
        booking_id: AggregateId,
        now: DateTime<Utc>,
        default_penalty: Money,
    ) -> Result<Vec<BookingEvent>, BookingError> {
        self.ensure_active(booking_id, "complete")?;

        let overflow = BookingError::ChargeOverflow {
            hourly_rate: self.hourly_rate,
        };
        let (penalty_applied, overstay_hours, penalty_amount) = if now > self.end_time {
            let overstay_hours = ceil_hours(now - self.end_time);
            let penalty = self
                .hourly_rate
                .checked_multiply(overstay_hours)
                .and_then(|overstay| overstay.checked_add(default_penalty))
                .ok_or(overflow)?;
            (true, overstay_hours, penalty)
        } else {
            (false, 0, Money::zero())
        };
        let total_amount = self
            .booking_amount
            .checked_add(penalty_amount)
            .ok_or(BookingError::ChargeOverflow {
                hourly_rate: self.hourly_rate,
            })?;

        Ok(vec![BookingEvent::BookingCompleted(BookingCompletedData {
            completed_at: now,
            penalty_applied,
            overstay_hours,
            penalty_amount,
            total_amount,
        })])
    }

    /// Cancels an active booking. Amounts stay as computed at creation.
    pub fn cancel(
        &self,
        booking_id: AggregateId,
        now: DateTime<Utc>,
    ) -> Result<Vec<BookingEvent>, BookingError> {
        self.ensure_active(booking_id, "cancel")?;

        Ok(vec![BookingEvent::BookingCancelled(BookingCancelledData {
            cancelled_at: now,
        })])
    }

    fn ensure_active(&self, booking_id: AggregateId, action: &'static str) -> Result<(), BookingError> {
        if self.id.is_none() {
            return Err(BookingError::NotFound(booking_id));
        }
        if !self.status.is_active() {
            return Err(BookingError::InvalidTransition {
                booking_id,
                status: self.status,
                action,
            });
        }
        Ok(())
    }
}
