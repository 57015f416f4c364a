//! Slot domain events.

use chrono::{DateTime, Utc};
use common::{AggregateId, UserId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::fee::Money;

use super::SlotType;

/// Events that can occur on a slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SlotEvent {
    SlotRegistered(SlotRegisteredData),

    SlotDetailsUpdated(SlotDetailsUpdatedData),

    SlotRateChanged(SlotRateChangedData),

    /// A booking claimed the slot.
    SlotReserved(SlotReservedData),

    /// The booking's vehicle checked in.
    SlotOccupied(SlotOccupiedData),

    /// The holding booking ended; the slot is available again.
    SlotReleased(SlotReleasedData),

    SlotRemoved(SlotRemovedData),
}

impl DomainEvent for SlotEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SlotEvent::SlotRegistered(_) => "SlotRegistered",
            SlotEvent::SlotDetailsUpdated(_) => "SlotDetailsUpdated",
            SlotEvent::SlotRateChanged(_) => "SlotRateChanged",
            SlotEvent::SlotReserved(_) => "SlotReserved",
            SlotEvent::SlotOccupied(_) => "SlotOccupied",
            SlotEvent::SlotReleased(_) => "SlotReleased",
            SlotEvent::SlotRemoved(_) => "SlotRemoved",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotRegisteredData {
    pub slot_id: AggregateId,
    pub slot_number: String,
    pub location: String,
    pub slot_type: SlotType,
    /// Zero means the fee policy default applies.
    pub hourly_rate: Money,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotDetailsUpdatedData {
    pub slot_number: String,
    pub location: String,
    pub slot_type: SlotType,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotRateChangedData {
    pub hourly_rate: Money,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotReservedData {
    pub booking_id: AggregateId,
    pub booked_by: UserId,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub reserved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotOccupiedData {
    pub booking_id: AggregateId,
    pub occupied_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotReleasedData {
    /// Booking that held the slot, if any was recorded.
    pub booking_id: Option<AggregateId>,
    pub released_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotRemovedData {
    pub removed_at: DateTime<Utc>,
}
