//! Reservation orchestrator: the entry point for booking operations.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{AggregateId, UserId};
use domain::{
    Booking, BookingError, BookingLedger, DomainError, SlotRegistry, Token, TokenError, TokenVault,
};
use event_store::EventStore;

use crate::error::{ReservationError, Result};

/// A created booking together with its verification token.
#[derive(Debug, Clone)]
pub struct Reservation {
    pub booking: Booking,
    pub token: Token,
}

/// Sequences the booking ledger and the token vault.
///
/// `create_reservation` either leaves an active booking with a token or
/// nothing at all: when issuing the token fails, the booking is cancelled
/// (which releases its slot) before the issuance error is returned.
pub struct ReservationOrchestrator<S: EventStore> {
    ledger: Arc<BookingLedger<S>>,
    tokens: Arc<TokenVault<S>>,
    slots: Arc<SlotRegistry<S>>,
}

impl<S: EventStore> ReservationOrchestrator<S> {
    pub fn new(
        ledger: Arc<BookingLedger<S>>,
        tokens: Arc<TokenVault<S>>,
        slots: Arc<SlotRegistry<S>>,
    ) -> Self {
        Self {
            ledger,
            tokens,
            slots,
        }
    }

    /// Books the slot for the window and issues the booking's token.
    #[tracing::instrument(skip(self))]
    pub async fn create_reservation(
        &self,
        user_id: UserId,
        slot_id: AggregateId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Reservation> {
        let started = std::time::Instant::now();
        let booking_id = AggregateId::new();

        let booking = self
            .ledger
            .create_with_id(booking_id, user_id, slot_id, start, end)
            .await?;

        let token = match self.tokens.issue(booking_id).await {
            Ok(token) => token,
            Err(original) => return Err(self.compensate(booking_id, original).await),
        };

        let duration = started.elapsed().as_secs_f64();
        metrics::counter!("reservations_created_total").increment(1);
        metrics::histogram!("reservation_duration_seconds").record(duration);
        tracing::info!(%booking_id, duration, "reservation created");

        Ok(Reservation { booking, token })
    }

    /// Cancels a reservation's booking and frees its slot.
    pub async fn cancel_reservation(&self, booking_id: AggregateId) -> Result<Booking> {
        Ok(self.ledger.cancel(booking_id).await?)
    }

    /// Completes a booking at `now`, applying any overstay penalty, and
    /// frees its slot.
    pub async fn complete_and_release(
        &self,
        booking_id: AggregateId,
        now: DateTime<Utc>,
    ) -> Result<Booking> {
        Ok(self.ledger.complete(booking_id, now).await?)
    }

    /// Consumes a token and checks its booking in, returning the booking id.
    ///
    /// The token is spent only once the check-in went through. A token whose
    /// booking is no longer active is refused and stays unused.
    #[tracing::instrument(skip(self, code))]
    pub async fn validate_token(&self, code: &str, now: DateTime<Utc>) -> Result<AggregateId> {
        let outcome = self.check_in(code, now).await;
        let label = match &outcome {
            Ok(_) => "accepted",
            Err(err) => err.kind().as_str(),
        };
        metrics::counter!("tokens_validated_total", "outcome" => label).increment(1);
        outcome
    }

    async fn check_in(&self, code: &str, now: DateTime<Utc>) -> Result<AggregateId> {
        let token = self
            .tokens
            .find_by_code(code)
            .await?
            .ok_or(DomainError::from(TokenError::NotFound))?;
        // Read-only: surfaces expiry and reuse before anything is written
        token.redeem(now).map_err(DomainError::from)?;

        let booking_id = token.booking_id();
        let booking = self.ledger.get(booking_id).await?;
        if !booking.is_active() {
            return Err(DomainError::from(BookingError::InvalidTransition {
                booking_id,
                status: booking.status(),
                action: "check in",
            })
            .into());
        }

        // Occupying again for the same booking is a no-op, so a check-in
        // whose redemption failed can be retried.
        self.slots.occupy(booking.slot_id(), booking_id).await?;
        self.tokens.validate(code, now).await?;

        tracing::info!(%booking_id, "booking checked in");
        Ok(booking_id)
    }

    pub async fn get_booking(&self, booking_id: AggregateId) -> Result<Booking> {
        Ok(self.ledger.get(booking_id).await?)
    }

    pub async fn list_bookings_by_user(&self, user_id: UserId) -> Result<Vec<Booking>> {
        Ok(self.ledger.list_by_user(user_id).await?)
    }

    /// The token issued for a booking, if any.
    pub async fn find_token(&self, booking_id: AggregateId) -> Result<Option<Token>> {
        Ok(self.tokens.find_by_booking(booking_id).await?)
    }

    /// Undoes a booking whose token could not be issued.
    async fn compensate(&self, booking_id: AggregateId, original: DomainError) -> ReservationError {
        metrics::counter!("reservation_compensations_total").increment(1);
        tracing::warn!(%booking_id, error = %original, "token issuance failed, cancelling booking");

        match self.ledger.cancel(booking_id).await {
            Ok(booking) => {
                tracing::info!(
                    %booking_id,
                    slot_id = %booking.slot_id(),
                    "booking cancelled after failed token issuance"
                );
                ReservationError::Domain(original)
            }
            Err(compensation) => {
                tracing::error!(
                    %booking_id,
                    error = %compensation,
                    "compensation failed"
                );
                ReservationError::CompensationFailed {
                    booking_id,
                    original: Box::new(original),
                    compensation: Box::new(compensation),
                }
            }
        }
    }
}
