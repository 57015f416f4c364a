//! Integration tests for the booking lifecycle.
//!
//! These tests drive the slot registry, booking ledger and token vault over a
//! shared event store and check the cross-record invariants.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use common::{AggregateId, UserId};
use domain::{
    Aggregate, BookingLedger, BookingStatus, DomainError, ErrorKind, FeeDefaults, FeePolicyService, Money,
    NewSlot, SlotError, SlotRegistry, SlotStatus, TokenVault,
};
use event_store::InMemoryEventStore;

struct Harness {
    fee_policy: Arc<FeePolicyService<InMemoryEventStore>>,
    slots: Arc<SlotRegistry<InMemoryEventStore>>,
    ledger: Arc<BookingLedger<InMemoryEventStore>>,
    tokens: TokenVault<InMemoryEventStore>,
}

fn harness() -> Harness {
    let store = InMemoryEventStore::new();
    let fee_policy = Arc::new(FeePolicyService::new(store.clone(), FeeDefaults::default()));
    let slots = Arc::new(SlotRegistry::new(store.clone(), fee_policy.clone()));
    let ledger = Arc::new(BookingLedger::new(store.clone(), slots.clone(), fee_policy.clone()));
    let tokens = TokenVault::new(store);
    Harness {
        fee_policy,
        slots,
        ledger,
        tokens,
    }
}

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 14, hour, minute, 0).unwrap()
}

async fn new_slot(harness: &Harness, number: &str) -> AggregateId {
    harness
        .slots
        .create_slot(NewSlot::new(number, "North garage"))
        .await
        .unwrap()
        .id()
        .unwrap()
}

mod charges {
    use super::*;

    #[tokio::test]
    async fn partial_hours_are_billed_in_full() {
        let harness = harness();
        let slot_id = new_slot(&harness, "N-1").await;

        let booking = harness
            .ledger
            .create(UserId::new(), slot_id, at(10, 0), at(11, 30))
            .await
            .unwrap();

        assert_eq!(booking.booking_amount(), Money::from_units(20));
        assert_eq!(booking.total_amount(), Money::from_units(20));
    }

    #[tokio::test]
    async fn overstay_adds_default_penalty_and_hourly_charge() {
        let harness = harness();
        let slot_id = new_slot(&harness, "N-1").await;
        let booking_id = harness
            .ledger
            .create(UserId::new(), slot_id, at(10, 0), at(11, 30))
            .await
            .unwrap()
            .id()
            .unwrap();

        let booking = harness.ledger.complete(booking_id, at(12, 10)).await.unwrap();

        assert_eq!(booking.status(), BookingStatus::Completed);
        assert!(booking.penalty_applied());
        assert_eq!(booking.overstay_hours(), 1);
        assert_eq!(booking.penalty_amount(), Money::from_units(60));
        assert_eq!(booking.total_amount(), Money::from_units(80));
        assert!(harness.slots.get_slot(slot_id).await.unwrap().is_available());
    }

    #[tokio::test]
    async fn slot_rate_overrides_policy_default() {
        let harness = harness();
        let slot_id = new_slot(&harness, "N-1").await;
        harness
            .slots
            .set_slot_rate(slot_id, Money::from_units(25))
            .await
            .unwrap();

        let booking = harness
            .ledger
            .create(UserId::new(), slot_id, at(9, 0), at(10, 0))
            .await
            .unwrap();
        assert_eq!(booking.booking_amount(), Money::from_units(25));
    }

    #[tokio::test]
    async fn later_policy_changes_keep_booked_rate() {
        let harness = harness();
        let slot_id = new_slot(&harness, "N-1").await;
        let booking_id = harness
            .ledger
            .create(UserId::new(), slot_id, at(10, 0), at(11, 0))
            .await
            .unwrap()
            .id()
            .unwrap();

        harness
            .fee_policy
            .update(Money::from_units(40), Money::from_units(100))
            .await
            .unwrap();

        // Rate stays at the booked 10.00; the penalty default is read at completion
        let booking = harness.ledger.complete(booking_id, at(11, 5)).await.unwrap();
        assert_eq!(booking.booking_amount(), Money::from_units(10));
        assert_eq!(booking.penalty_amount(), Money::from_units(110));
        assert_eq!(booking.total_amount(), Money::from_units(120));
    }
}

mod transitions {
    use super::*;

    #[tokio::test]
    async fn complete_succeeds_once() {
        let harness = harness();
        let slot_id = new_slot(&harness, "N-1").await;
        let booking_id = harness
            .ledger
            .create(UserId::new(), slot_id, at(10, 0), at(11, 0))
            .await
            .unwrap()
            .id()
            .unwrap();

        harness.ledger.complete(booking_id, at(10, 30)).await.unwrap();
        let err = harness.ledger.complete(booking_id, at(10, 31)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn cancelled_booking_cannot_be_cancelled_again() {
        let harness = harness();
        let slot_id = new_slot(&harness, "N-1").await;
        let booking_id = harness
            .ledger
            .create(UserId::new(), slot_id, at(10, 0), at(11, 0))
            .await
            .unwrap()
            .id()
            .unwrap();

        let booking = harness.ledger.cancel(booking_id).await.unwrap();
        assert_eq!(booking.status(), BookingStatus::Cancelled);
        assert_eq!(booking.total_amount(), Money::from_units(10));

        let err = harness.ledger.cancel(booking_id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(
            harness.slots.get_slot(slot_id).await.unwrap().status(),
            SlotStatus::Available
        );
    }

    #[tokio::test]
    async fn released_slot_can_be_booked_again() {
        let harness = harness();
        let slot_id = new_slot(&harness, "N-1").await;
        let first = harness
            .ledger
            .create(UserId::new(), slot_id, at(10, 0), at(11, 0))
            .await
            .unwrap();

        let blocked = harness
            .ledger
            .create(UserId::new(), slot_id, at(12, 0), at(13, 0))
            .await;
        assert!(matches!(
            blocked,
            Err(DomainError::Slot(SlotError::Unavailable { .. }))
        ));

        harness.ledger.cancel(first.id().unwrap()).await.unwrap();
        harness
            .ledger
            .create(UserId::new(), slot_id, at(12, 0), at(13, 0))
            .await
            .unwrap();
    }
}

mod tokens {
    use super::*;

    #[tokio::test]
    async fn token_validates_once() {
        let harness = harness();
        let booking_id = AggregateId::new();
        let token = harness.tokens.issue(booking_id).await.unwrap();

        let validated = harness.tokens.validate(token.code(), Utc::now()).await.unwrap();
        assert_eq!(validated, booking_id);

        let err = harness
            .tokens
            .validate(token.code(), Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TokenAlreadyUsed);
    }

    #[tokio::test]
    async fn token_expires_after_a_day() {
        let harness = harness();
        let issued_at = at(8, 0);
        let token = harness
            .tokens
            .issue_at(AggregateId::new(), issued_at)
            .await
            .unwrap();

        let err = harness
            .tokens
            .validate(token.code(), issued_at + TimeDelta::hours(24) + TimeDelta::minutes(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TokenExpired);

        // An expired token is not consumed by the failed attempt
        let token = harness
            .tokens
            .find_by_booking(token.booking_id())
            .await
            .unwrap()
            .unwrap();
        assert!(!token.is_used());
    }
}

mod concurrency {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn one_active_booking_per_slot() {
        let harness = harness();
        let slot_id = new_slot(&harness, "N-1").await;

        let mut handles = Vec::new();
        for _ in 0..10 {
            let ledger = harness.ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger.create(UserId::new(), slot_id, at(10, 0), at(11, 0)).await
            }));
        }

        let mut created = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                Ok(booking) => created.push(booking),
                Err(err) => assert_eq!(err.kind(), ErrorKind::ResourceUnavailable),
            }
        }
        assert_eq!(created.len(), 1);

        let slot = harness.slots.get_slot(slot_id).await.unwrap();
        assert_eq!(slot.status(), SlotStatus::Reserved);
        assert_eq!(slot.booking_id(), created[0].id());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn different_slots_book_independently() {
        let harness = harness();
        let mut slot_ids = Vec::new();
        for n in 0..5 {
            slot_ids.push(new_slot(&harness, &format!("N-{n}")).await);
        }

        let mut handles = Vec::new();
        for slot_id in slot_ids {
            let ledger = harness.ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger.create(UserId::new(), slot_id, at(10, 0), at(11, 0)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert!(harness.slots.list_available().await.unwrap().is_empty());
    }
}
