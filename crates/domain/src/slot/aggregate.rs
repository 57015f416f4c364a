//! Slot aggregate implementation.

use chrono::{DateTime, Utc};
use common::{AggregateId, UserId};
use event_store::Version;

use crate::aggregate::Aggregate;
use crate::fee::Money;

use super::{
    NewSlot, SlotDetails, SlotError, SlotEvent, SlotStatus, SlotType,
    events::{
        SlotDetailsUpdatedData, SlotOccupiedData, SlotRateChangedData, SlotRegisteredData,
        SlotReleasedData, SlotRemovedData, SlotReservedData,
    },
};

/// A bookable parking slot.
///
/// A slot is held by at most one active booking at a time; `booking_id`,
/// `booked_by` and the window are set exactly while the status is held.
#[derive(Debug, Clone, Default)]
pub struct Slot {
    id: Option<AggregateId>,
    version: Version,
    slot_number: String,
    location: String,
    slot_type: SlotType,
    /// Zero means the fee policy default applies.
    hourly_rate: Money,
    status: SlotStatus,
    booking_id: Option<AggregateId>,
    booked_by: Option<UserId>,
    window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    registered_at: Option<DateTime<Utc>>,
    removed: bool,
}

impl Aggregate for Slot {
    type Event = SlotEvent;
    type Error = SlotError;

    fn aggregate_type() -> &'static str {
        "Slot"
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
            SlotEvent::SlotRegistered(data) => {
                self.id = Some(data.slot_id);
                self.slot_number = data.slot_number;
                self.location = data.location;
                self.slot_type = data.slot_type;
                self.hourly_rate = data.hourly_rate;
                self.status = SlotStatus::Available;
                self.registered_at = Some(data.registered_at);
            }
            SlotEvent::SlotDetailsUpdated(data) => {
                self.slot_number = data.slot_number;
                self.location = data.location;
                self.slot_type = data.slot_type;
            }
            SlotEvent::SlotRateChanged(data) => {
                self.hourly_rate = data.hourly_rate;
            }
            SlotEvent::SlotReserved(data) => {
                self.status = SlotStatus::Reserved;
                self.booking_id = Some(data.booking_id);
                self.booked_by = Some(data.booked_by);
                self.window = Some((data.window_start, data.window_end));
            }
            SlotEvent::SlotOccupied(_) => {
                self.status = SlotStatus::Occupied;
            }
            SlotEvent::SlotReleased(_) => {
                self.status = SlotStatus::Available;
                self.booking_id = None;
                self.booked_by = None;
                self.window = None;
            }
            SlotEvent::SlotRemoved(_) => {
                self.removed = true;
            }
        }
    }
}

// Query methods
impl Slot {
    pub fn slot_number(&self) -> &str {
        &self.slot_number
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn slot_type(&self) -> SlotType {
        self.slot_type
    }

    /// Slot-specific rate; zero when the fee policy default applies.
    pub fn hourly_rate(&self) -> Money {
        self.hourly_rate
    }

    pub fn status(&self) -> SlotStatus {
        self.status
    }

    /// Booking currently holding the slot.
    pub fn booking_id(&self) -> Option<AggregateId> {
        self.booking_id
    }

    pub fn booked_by(&self) -> Option<UserId> {
        self.booked_by
    }

    /// Reserved window of the holding booking.
    pub fn window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.window
    }

    pub fn registered_at(&self) -> Option<DateTime<Utc>> {
        self.registered_at
    }

    /// Returns true if the slot was registered and has not been removed.
    pub fn is_live(&self) -> bool {
        self.id.is_some() && !self.removed
    }

    pub fn is_available(&self) -> bool {
        self.is_live() && self.status.can_reserve()
    }
}

// Command methods (return events)
impl Slot {
    pub fn register(
        &self,
        slot_id: AggregateId,
        slot: &NewSlot,
        now: DateTime<Utc>,
    ) -> Result<Vec<SlotEvent>, SlotError> {
        if self.id.is_some() {
            return Err(SlotError::AlreadyRegistered(slot_id));
        }
        if slot.slot_number.trim().is_empty() {
            return Err(SlotError::EmptyNumber);
        }
        if slot.hourly_rate.is_negative() {
            return Err(SlotError::InvalidRate(slot.hourly_rate));
        }

        Ok(vec![SlotEvent::SlotRegistered(SlotRegisteredData {
            slot_id,
            slot_number: slot.slot_number.clone(),
            location: slot.location.clone(),
            slot_type: slot.slot_type,
            hourly_rate: slot.hourly_rate,
            registered_at: now,
        })])
    }

    /// Replaces number, location and type. A positive rate also replaces
    /// the slot rate; zero leaves it untouched.
    pub fn update_details(
        &self,
        slot_id: AggregateId,
        details: &SlotDetails,
        now: DateTime<Utc>,
    ) -> Result<Vec<SlotEvent>, SlotError> {
        self.ensure_live(slot_id)?;
        if details.slot_number.trim().is_empty() {
            return Err(SlotError::EmptyNumber);
        }
        if details.hourly_rate.is_negative() {
            return Err(SlotError::InvalidRate(details.hourly_rate));
        }

        let mut events = vec![SlotEvent::SlotDetailsUpdated(SlotDetailsUpdatedData {
            slot_number: details.slot_number.clone(),
            location: details.location.clone(),
            slot_type: details.slot_type,
            updated_at: now,
        })];
        if !details.hourly_rate.is_zero() && details.hourly_rate != self.hourly_rate {
            events.push(SlotEvent::SlotRateChanged(SlotRateChangedData {
                hourly_rate: details.hourly_rate,
                changed_at: now,
            }));
        }
        Ok(events)
    }

    /// Sets the slot rate; zero reverts the slot to the policy default.
    pub fn set_rate(
        &self,
        slot_id: AggregateId,
        hourly_rate: Money,
        now: DateTime<Utc>,
    ) -> Result<Vec<SlotEvent>, SlotError> {
        self.ensure_live(slot_id)?;
        if hourly_rate.is_negative() {
            return Err(SlotError::InvalidRate(hourly_rate));
        }
        if hourly_rate == self.hourly_rate {
            return Ok(vec![]);
        }

        Ok(vec![SlotEvent::SlotRateChanged(SlotRateChangedData {
            hourly_rate,
            changed_at: now,
        })])
    }

    /// Claims the slot for a booking. Only an available slot can be claimed.
    pub fn reserve(
        &self,
        slot_id: AggregateId,
        booking_id: AggregateId,
        booked_by: UserId,
        window: (DateTime<Utc>, DateTime<Utc>),
        now: DateTime<Utc>,
    ) -> Result<Vec<SlotEvent>, SlotError> {
        self.ensure_live(slot_id)?;
        if !self.status.can_reserve() {
            return Err(SlotError::Unavailable {
                slot_id,
                status: self.status,
            });
        }

        Ok(vec![SlotEvent::SlotReserved(SlotReservedData {
            booking_id,
            booked_by,
            window_start: window.0,
            window_end: window.1,
            reserved_at: now,
        })])
    }

    /// Marks the vehicle of the holding booking as checked in. Repeating the
    /// check-in of the same booking records nothing.
    pub fn occupy(
        &self,
        slot_id: AggregateId,
        booking_id: AggregateId,
        now: DateTime<Utc>,
    ) -> Result<Vec<SlotEvent>, SlotError> {
        self.ensure_live(slot_id)?;
        let holder = self.booking_id == Some(booking_id);
        if holder && self.status == SlotStatus::Occupied {
            return Ok(vec![]);
        }
        if !self.status.can_occupy() || !holder {
            return Err(SlotError::NotHeldBy {
                slot_id,
                booking_id,
            });
        }

        Ok(vec![SlotEvent::SlotOccupied(SlotOccupiedData {
            booking_id,
            occupied_at: now,
        })])
    }

    /// Makes the slot available again, whoever holds it. Releasing an
    /// available slot records nothing.
    pub fn release(
        &self,
        slot_id: AggregateId,
        now: DateTime<Utc>,
    ) -> Result<Vec<SlotEvent>, SlotError> {
        self.ensure_live(slot_id)?;
        if !self.status.is_held() {
            return Ok(vec![]);
        }

        Ok(vec![SlotEvent::SlotReleased(SlotReleasedData {
            booking_id: self.booking_id,
            released_at: now,
        })])
    }

    /// Makes the slot available again on behalf of `booking_id`.
    ///
    /// Records nothing unless that booking still holds the slot. Unknown and
    /// removed slots record nothing either.
    pub fn release_for(
        &self,
        booking_id: AggregateId,
        now: DateTime<Utc>,
    ) -> Vec<SlotEvent> {
        if !self.is_live() || !self.status.is_held() || self.booking_id != Some(booking_id) {
            return vec![];
        }

        vec![SlotEvent::SlotReleased(SlotReleasedData {
            booking_id: Some(booking_id),
            released_at: now,
        })]
    }

    /// Takes the slot out of the catalog. A held slot cannot be removed.
    pub fn remove(
        &self,
        slot_id: AggregateId,
        now: DateTime<Utc>,
    ) -> Result<Vec<SlotEvent>, SlotError> {
        self.ensure_live(slot_id)?;
        if self.status.is_held() {
            return Err(SlotError::InUse {
                slot_id,
                status: self.status,
            });
        }

        Ok(vec![SlotEvent::SlotRemoved(SlotRemovedData { removed_at: now })])
    }

    fn ensure_live(&self, slot_id: AggregateId) -> Result<(), SlotError> {
        if self.is_live() {
            Ok(())
        } else {
            Err(SlotError::NotFound(slot_id))
        }
    }
}
