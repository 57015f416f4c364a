//! Slot catalog and availability service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{AggregateId, UserId};
use event_store::{EventQuery, EventStore};
use tokio::sync::Mutex;

use crate::aggregate::Aggregate;
use crate::command::CommandHandler;
use crate::error::DomainError;
use crate::fee::{FeePolicyService, Money};

use super::{NewSlot, Slot, SlotDetails, SlotError};

/// Owns every slot's catalog entry and availability.
///
/// Availability changes (`reserve`, `occupy`, `release`, `release_for`) are guarded by the
/// conditional append of the command handler, so two callers can never both
/// claim the same slot. Catalog changes additionally take an in-process lock
/// so the slot-number uniqueness check and the write do not interleave.
pub struct SlotRegistry<S: EventStore> {
    handler: CommandHandler<S, Slot>,
    fee_policy: Arc<FeePolicyService<S>>,
    catalog: Mutex<()>,
}

impl<S: EventStore> SlotRegistry<S> {
    pub fn new(store: S, fee_policy: Arc<FeePolicyService<S>>) -> Self {
        Self {
            handler: CommandHandler::new(store),
            fee_policy,
            catalog: Mutex::new(()),
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.handler = self.handler.with_max_attempts(max_attempts);
        self
    }

    /// Registers a new slot, available immediately.
    #[tracing::instrument(skip(self, slot), fields(slot_number = %slot.slot_number))]
    pub async fn create_slot(&self, slot: NewSlot) -> Result<Slot, DomainError> {
        let _catalog = self.catalog.lock().await;
        self.ensure_number_free(&slot.slot_number, None).await?;

        let slot_id = AggregateId::new();
        let now = Utc::now();
        let result = self
            .handler
            .execute(slot_id, |current| current.register(slot_id, &slot, now))
            .await?;

        tracing::info!(%slot_id, "slot registered");
        Ok(result.aggregate)
    }

    /// Updates number, location and type; the rate only when positive.
    #[tracing::instrument(skip(self, details))]
    pub async fn update_slot(
        &self,
        slot_id: AggregateId,
        details: SlotDetails,
    ) -> Result<Slot, DomainError> {
        let _catalog = self.catalog.lock().await;
        self.ensure_number_free(&details.slot_number, Some(slot_id)).await?;

        let now = Utc::now();
        let result = self
            .handler
            .execute(slot_id, |slot| slot.update_details(slot_id, &details, now))
            .await?;

        tracing::info!("slot updated");
        Ok(result.aggregate)
    }

    /// Sets the slot-specific rate. Zero reverts to the fee policy default.
    #[tracing::instrument(skip(self))]
    pub async fn set_slot_rate(
        &self,
        slot_id: AggregateId,
        hourly_rate: Money,
    ) -> Result<Slot, DomainError> {
        let now = Utc::now();
        let result = self
            .handler
            .execute(slot_id, |slot| slot.set_rate(slot_id, hourly_rate, now))
            .await?;

        tracing::info!(%hourly_rate, "slot rate set");
        Ok(result.aggregate)
    }

    /// Removes a slot from the catalog. Refused while a booking holds it.
    #[tracing::instrument(skip(self))]
    pub async fn delete_slot(&self, slot_id: AggregateId) -> Result<Slot, DomainError> {
        let _catalog = self.catalog.lock().await;
        let now = Utc::now();
        let result = self
            .handler
            .execute(slot_id, |slot| slot.remove(slot_id, now))
            .await?;

        tracing::info!("slot removed");
        Ok(result.aggregate)
    }

    pub async fn get_slot(&self, slot_id: AggregateId) -> Result<Slot, DomainError> {
        self.find_slot(slot_id)
            .await?
            .ok_or_else(|| SlotError::NotFound(slot_id).into())
    }

    /// Returns the slot, or None if it is unknown or removed.
    pub async fn find_slot(&self, slot_id: AggregateId) -> Result<Option<Slot>, DomainError> {
        let slot = self.handler.load(slot_id).await?;
        Ok(slot.is_live().then_some(slot))
    }

    /// All live slots in registration order.
    pub async fn list_slots(&self) -> Result<Vec<Slot>, DomainError> {
        let query = EventQuery::for_aggregate_type(Slot::aggregate_type()).event_type("SlotRegistered");
        let envelopes = self.handler.store().query(query).await?;

        let mut slots = Vec::with_capacity(envelopes.len());
        for envelope in envelopes {
            if let Some(slot) = self.find_slot(envelope.aggregate_id).await? {
                slots.push(slot);
            }
        }
        Ok(slots)
    }

    pub async fn list_available(&self) -> Result<Vec<Slot>, DomainError> {
        let mut slots = self.list_slots().await?;
        slots.retain(Slot::is_available);
        Ok(slots)
    }

    /// Rate a booking on this slot is billed at.
    pub async fn effective_rate(&self, slot: &Slot) -> Result<Money, DomainError> {
        let policy = self.fee_policy.current().await?;
        Ok(policy.resolve_rate(slot.hourly_rate()))
    }

    /// Claims an available slot for a booking.
    ///
    /// Of any number of concurrent callers on the same slot exactly one
    /// succeeds; the others see `SlotError::Unavailable`.
    #[tracing::instrument(skip(self))]
    pub async fn reserve(
        &self,
        slot_id: AggregateId,
        booking_id: AggregateId,
        user_id: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Slot, DomainError> {
        let now = Utc::now();
        let result = self
            .handler
            .execute(slot_id, |slot| {
                slot.reserve(slot_id, booking_id, user_id, (start, end), now)
            })
            .await?;

        tracing::debug!("slot reserved");
        Ok(result.aggregate)
    }

    /// Checks in the vehicle of the booking holding the slot.
    #[tracing::instrument(skip(self))]
    pub async fn occupy(
        &self,
        slot_id: AggregateId,
        booking_id: AggregateId,
    ) -> Result<Slot, DomainError> {
        let now = Utc::now();
        let result = self
            .handler
            .execute(slot_id, |slot| slot.occupy(slot_id, booking_id, now))
            .await?;

        tracing::debug!("slot occupied");
        Ok(result.aggregate)
    }

    /// Makes the slot available, whoever holds it. A no-op on a slot that is
    /// already available.
    #[tracing::instrument(skip(self))]
    pub async fn release(&self, slot_id: AggregateId) -> Result<Slot, DomainError> {
        let now = Utc::now();
        let result = self
            .handler
            .execute(slot_id, |slot| slot.release(slot_id, now))
            .await?;

        if !result.events.is_empty() {
            tracing::debug!("slot released");
        }
        Ok(result.aggregate)
    }

    /// Makes the slot available if `booking_id` still holds it.
    ///
    /// Returns whether anything was released. A slot held by another booking,
    /// already available, or unknown is left as it is.
    #[tracing::instrument(skip(self))]
    pub async fn release_for(
        &self,
        slot_id: AggregateId,
        booking_id: AggregateId,
    ) -> Result<bool, DomainError> {
        let now = Utc::now();
        let result = self
            .handler
            .execute(slot_id, |slot| {
                Ok::<_, SlotError>(slot.release_for(booking_id, now))
            })
            .await?;

        let released = !result.events.is_empty();
        if released {
            tracing::debug!("slot released");
        }
        Ok(released)
    }

    async fn ensure_number_free(
        &self,
        slot_number: &str,
        except: Option<AggregateId>,
    ) -> Result<(), DomainError> {
        let taken = self.list_slots().await?.into_iter().any(|slot| {
            slot.slot_number() == slot_number && slot.id() != except
        });
        if taken {
            return Err(SlotError::DuplicateNumber(slot_number.to_string()).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fee::FeeDefaults;
    use crate::slot::{SlotStatus, SlotType};
    use chrono::TimeDelta;
    use event_store::InMemoryEventStore;

    fn registry() -> SlotRegistry<InMemoryEventStore> {
        let store = InMemoryEventStore::new();
        let fee_policy = Arc::new(FeePolicyService::new(store.clone(), FeeDefaults::default()));
        SlotRegistry::new(store, fee_policy)
    }

    async fn reserve(
        registry: &SlotRegistry<InMemoryEventStore>,
        slot_id: AggregateId,
    ) -> Result<Slot, DomainError> {
        let start = Utc::now();
        registry
            .reserve(slot_id, AggregateId::new(), UserId::new(), start, start + TimeDelta::hours(1))
            .await
    }

    #[tokio::test]
    async fn create_and_get_slot() {
        let registry = registry();
        let created = registry
            .create_slot(NewSlot::new("A-1", "Level 1").slot_type(SlotType::Handicapped))
            .await
            .unwrap();
        let slot_id = created.id().unwrap();

        let slot = registry.get_slot(slot_id).await.unwrap();
        assert_eq!(slot.slot_number(), "A-1");
        assert_eq!(slot.slot_type(), SlotType::Handicapped);
        assert_eq!(slot.status(), SlotStatus::Available);
    }

    #[tokio::test]
    async fn duplicate_numbers_are_rejected() {
        let registry = registry();
        registry.create_slot(NewSlot::new("A-1", "L1")).await.unwrap();

        let result = registry.create_slot(NewSlot::new("A-1", "L2")).await;
        assert!(matches!(
            result,
            Err(DomainError::Slot(SlotError::DuplicateNumber(number))) if number == "A-1"
        ));
    }

    #[tokio::test]
    async fn update_may_keep_its_own_number() {
        let registry = registry();
        let slot = registry.create_slot(NewSlot::new("A-1", "L1")).await.unwrap();
        registry.create_slot(NewSlot::new("A-2", "L1")).await.unwrap();
        let slot_id = slot.id().unwrap();

        let details = SlotDetails {
            slot_number: "A-1".into(),
            location: "L3".into(),
            slot_type: SlotType::Vip,
            hourly_rate: Money::zero(),
        };
        let updated = registry.update_slot(slot_id, details.clone()).await.unwrap();
        assert_eq!(updated.location(), "L3");

        let clash = SlotDetails {
            slot_number: "A-2".into(),
            ..details
        };
        assert!(matches!(
            registry.update_slot(slot_id, clash).await,
            Err(DomainError::Slot(SlotError::DuplicateNumber(_)))
        ));
    }

    #[tokio::test]
    async fn zero_rate_resolves_to_policy_default() {
        let registry = registry();
        let slot = registry.create_slot(NewSlot::new("A-1", "L1")).await.unwrap();
        assert_eq!(registry.effective_rate(&slot).await.unwrap(), Money::from_units(10));

        let slot = registry
            .set_slot_rate(slot.id().unwrap(), Money::from_units(30))
            .await
            .unwrap();
        assert_eq!(registry.effective_rate(&slot).await.unwrap(), Money::from_units(30));
    }

    #[tokio::test]
    async fn reserve_release_cycle() {
        let registry = registry();
        let slot_id = registry
            .create_slot(NewSlot::new("A-1", "L1"))
            .await
            .unwrap()
            .id()
            .unwrap();

        let slot = reserve(&registry, slot_id).await.unwrap();
        assert_eq!(slot.status(), SlotStatus::Reserved);
        assert!(registry.list_available().await.unwrap().is_empty());
        let holder = slot.booking_id().unwrap();

        assert!(matches!(
            reserve(&registry, slot_id).await,
            Err(DomainError::Slot(SlotError::Unavailable { .. }))
        ));

        // Only the holder can hand the slot back
        assert!(!registry.release_for(slot_id, AggregateId::new()).await.unwrap());
        assert_eq!(registry.get_slot(slot_id).await.unwrap().status(), SlotStatus::Reserved);

        assert!(registry.release_for(slot_id, holder).await.unwrap());
        assert!(registry.get_slot(slot_id).await.unwrap().is_available());

        // Releasing again is a no-op success
        assert!(!registry.release_for(slot_id, holder).await.unwrap());
        let slot = registry.release(slot_id).await.unwrap();
        assert_eq!(slot.status(), SlotStatus::Available);
        assert_eq!(registry.list_available().await.unwrap().len(), 1);

        // An unconditional release frees the slot from any holder
        reserve(&registry, slot_id).await.unwrap();
        let slot = registry.release(slot_id).await.unwrap();
        assert_eq!(slot.status(), SlotStatus::Available);
    }

    #[tokio::test]
    async fn unknown_slot_is_not_found() {
        let registry = registry();
        let slot_id = AggregateId::new();

        assert!(matches!(
            reserve(&registry, slot_id).await,
            Err(DomainError::Slot(SlotError::NotFound(id))) if id == slot_id
        ));
        assert!(matches!(
            registry.release(slot_id).await,
            Err(DomainError::Slot(SlotError::NotFound(_)))
        ));
        assert!(!registry.release_for(slot_id, AggregateId::new()).await.unwrap());
    }

    #[tokio::test]
    async fn deleted_slot_disappears_and_frees_its_number() {
        let registry = registry();
        let slot_id = registry
            .create_slot(NewSlot::new("A-1", "L1"))
            .await
            .unwrap()
            .id()
            .unwrap();

        registry.delete_slot(slot_id).await.unwrap();
        assert!(registry.find_slot(slot_id).await.unwrap().is_none());
        assert!(registry.list_slots().await.unwrap().is_empty());
        assert!(matches!(
            registry.get_slot(slot_id).await,
            Err(DomainError::Slot(SlotError::NotFound(_)))
        ));

        registry.create_slot(NewSlot::new("A-1", "L1")).await.unwrap();
    }

    #[tokio::test]
    async fn held_slot_cannot_be_deleted() {
        let registry = registry();
        let slot_id = registry
            .create_slot(NewSlot::new("A-1", "L1"))
            .await
            .unwrap()
            .id()
            .unwrap();
        reserve(&registry, slot_id).await.unwrap();

        let err = registry.delete_slot(slot_id).await.unwrap_err();
        assert!(matches!(err, DomainError::Slot(SlotError::InUse { .. })));
        assert_eq!(err.kind(), crate::ErrorKind::InvalidState);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reservations_have_one_winner() {
        let registry = Arc::new(registry());
        let slot_id = registry
            .create_slot(NewSlot::new("A-1", "L1"))
            .await
            .unwrap()
            .id()
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move { reserve(&registry, slot_id).await }));
        }

        let mut winners = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => winners += 1,
                Err(DomainError::Slot(SlotError::Unavailable { .. })) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(winners, 1);
    }
}
