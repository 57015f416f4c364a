//! Booking ledger service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{AggregateId, UserId};
use event_store::{EventQuery, EventStore};

use crate::aggregate::Aggregate;
use crate::command::CommandHandler;
use crate::error::DomainError;
use crate::fee::FeePolicyService;
use crate::slot::SlotRegistry;

use super::{Booking, BookingError, BookingEvent};

/// Owns booking records and keeps their slots in step.
///
/// A slot is held exactly while an active booking references it: `create`
/// claims the slot before recording the booking, and the terminal
/// transitions record the booking's end before handing the slot back.
pub struct BookingLedger<S: EventStore> {
    handler: CommandHandler<S, Booking>,
    slots: Arc<SlotRegistry<S>>,
    fee_policy: Arc<FeePolicyService<S>>,
}

impl<S: EventStore> BookingLedger<S> {
    pub fn new(
        store: S,
        slots: Arc<SlotRegistry<S>>,
        fee_policy: Arc<FeePolicyService<S>>,
    ) -> Self {
        Self {
            handler: CommandHandler::new(store),
            slots,
            fee_policy,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.handler = self.handler.with_max_attempts(max_attempts);
        self
    }

    /// Reserves the slot and records an active booking for the window.
    ///
    /// The charge is computed before the slot is claimed. Slot failures are
    /// returned unchanged. If the booking cannot be recorded after the slot
    /// was claimed, the slot is released first.
    pub async fn create(
        &self,
        user_id: UserId,
        slot_id: AggregateId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Booking, DomainError> {
        self.create_with_id(AggregateId::new(), user_id, slot_id, start, end)
            .await
    }

    /// Like `create`, for callers that pick the booking id up front.
    #[tracing::instrument(skip(self))]
    pub async fn create_with_id(
        &self,
        booking_id: AggregateId,
        user_id: UserId,
        slot_id: AggregateId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Booking, DomainError> {
        Booking::check_window(start, end)?;

        let slot = self.slots.get_slot(slot_id).await?;
        let hourly_rate = self.slots.effective_rate(&slot).await?;
        Booking::charge_for(hourly_rate, start, end)?;

        self.slots.reserve(slot_id, booking_id, user_id, start, end).await?;

        let now = Utc::now();
        let recorded = self
            .handler
            .execute(booking_id, |booking| {
                booking.create(booking_id, user_id, slot_id, start, end, hourly_rate, now)
            })
            .await;

        match recorded {
            Ok(result) => {
                tracing::info!(%booking_id, amount = %result.aggregate.booking_amount(), "booking created");
                Ok(result.aggregate)
            }
            Err(err) => {
                if let Err(release_err) = self.slots.release_for(slot_id, booking_id).await {
                    tracing::error!(%booking_id, error = %release_err, "failed to release slot of unrecorded booking");
                }
                Err(err)
            }
        }
    }

    /// Cancels an active booking and frees its slot.
    ///
    /// Cancelling a booking that already ended is refused, but still frees a
    /// slot the earlier transition left held.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, booking_id: AggregateId) -> Result<Booking, DomainError> {
        let now = Utc::now();
        let booking = match self
            .handler
            .execute(booking_id, |booking| booking.cancel(booking_id, now))
            .await
        {
            Ok(result) => result.aggregate,
            Err(err) => return Err(self.settle_ended(booking_id, err).await),
        };

        self.release_slot(&booking, booking_id).await?;

        metrics::counter!("bookings_cancelled_total").increment(1);
        tracing::info!("booking cancelled");
        Ok(booking)
    }

    /// Completes an active booking at `now`, applying any overstay penalty,
    /// and frees its slot. Ended bookings are handled as in `cancel`.
    #[tracing::instrument(skip(self))]
    pub async fn complete(
        &self,
        booking_id: AggregateId,
        now: DateTime<Utc>,
    ) -> Result<Booking, DomainError> {
        let policy = self.fee_policy.current().await?;
        let default_penalty = policy.default_penalty();

        let booking = match self
            .handler
            .execute(booking_id, |booking| {
                booking.complete(booking_id, now, default_penalty)
            })
            .await
        {
            Ok(result) => result.aggregate,
            Err(err) => return Err(self.settle_ended(booking_id, err).await),
        };

        self.release_slot(&booking, booking_id).await?;

        metrics::counter!("bookings_completed_total").increment(1);
        if booking.penalty_applied() {
            metrics::counter!("booking_penalties_total").increment(1);
        }
        tracing::info!(
            total = %booking.total_amount(),
            penalty = %booking.penalty_amount(),
            "booking completed"
        );
        Ok(booking)
    }

    pub async fn get(&self, booking_id: AggregateId) -> Result<Booking, DomainError> {
        self.handler
            .load_existing(booking_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(booking_id).into())
    }

    /// Every booking of a user, in creation order.
    pub async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Booking>, DomainError> {
        let query =
            EventQuery::for_aggregate_type(Booking::aggregate_type()).event_type("BookingCreated");
        let envelopes = self.handler.store().query(query).await?;

        let mut bookings = Vec::new();
        for envelope in envelopes {
            let BookingEvent::BookingCreated(data) = envelope.decode::<BookingEvent>()? else {
                continue;
            };
            if data.user_id != user_id {
                continue;
            }
            if let Some(booking) = self.handler.load_existing(data.booking_id).await? {
                bookings.push(booking);
            }
        }
        Ok(bookings)
    }

    pub async fn list_active_by_user(&self, user_id: UserId) -> Result<Vec<Booking>, DomainError> {
        let mut bookings = self.list_by_user(user_id).await?;
        bookings.retain(Booking::is_active);
        Ok(bookings)
    }

    async fn release_slot(&self, booking: &Booking, booking_id: AggregateId) -> Result<bool, DomainError> {
        let slot_id = booking.slot_id();
        self.slots.release_for(slot_id, booking_id).await.map_err(|source| {
            tracing::error!(%slot_id, error = %source, "slot release failed");
            BookingError::SlotRelease {
                booking_id,
                slot_id,
                source: Box::new(source),
            }
            .into()
        })
    }

    /// Turns a refused terminal transition into its final error, freeing the
    /// slot of an ended booking if it is still held by it.
    async fn settle_ended(&self, booking_id: AggregateId, err: DomainError) -> DomainError {
        if !matches!(err, DomainError::Booking(BookingError::InvalidTransition { .. })) {
            return err;
        }
        let booking = match self.handler.load_existing(booking_id).await {
            Ok(Some(booking)) => booking,
            Ok(None) => return err,
            Err(load_err) => return load_err,
        };

        match self.release_slot(&booking, booking_id).await {
            Ok(true) => {
                tracing::warn!(%booking_id, slot_id = %booking.slot_id(), "freed slot left held by ended booking");
                err
            }
            Ok(false) => err,
            Err(release_err) => release_err,
        }
    }
}
