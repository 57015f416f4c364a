//! Parking slots and their availability.

mod aggregate;
mod events;
mod registry;
mod state;

pub use aggregate::Slot;
pub use events::{
    SlotDetailsUpdatedData, SlotEvent, SlotOccupiedData, SlotRateChangedData, SlotRegisteredData,
    SlotReleasedData, SlotRemovedData, SlotReservedData,
};
pub use registry::SlotRegistry;
pub use state::{SlotStatus, SlotType};

use common::AggregateId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ErrorKind;
use crate::fee::Money;

/// Fields of a slot being registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSlot {
    pub slot_number: String,
    pub location: String,
    #[serde(default)]
    pub slot_type: SlotType,
    /// Zero (or omitted) means the fee policy default applies.
    #[serde(default)]
    pub hourly_rate: Money,
}

impl NewSlot {
    pub fn new(slot_number: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            slot_number: slot_number.into(),
            location: location.into(),
            slot_type: SlotType::default(),
            hourly_rate: Money::zero(),
        }
    }

    pub fn slot_type(mut self, slot_type: SlotType) -> Self {
        self.slot_type = slot_type;
        self
    }

    pub fn hourly_rate(mut self, hourly_rate: Money) -> Self {
        self.hourly_rate = hourly_rate;
        self
    }
}

/// Administrative changes to a slot's descriptive fields.
///
/// The rate is only changed when positive; use `set_slot_rate` to clear it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDetails {
    pub slot_number: String,
    pub location: String,
    pub slot_type: SlotType,
    #[serde(default)]
    pub hourly_rate: Money,
}

/// Errors that can occur during slot operations.
#[derive(Debug, Error)]
pub enum SlotError {
    #[error("Slot not found: {0}")]
    NotFound(AggregateId),

    #[error("Slot {slot_id} is not available (currently {status})")]
    Unavailable {
        slot_id: AggregateId,
        status: SlotStatus,
    },

    #[error("Slot number already exists: {0}")]
    DuplicateNumber(String),

    #[error("Slot {slot_id} is in use (currently {status})")]
    InUse {
        slot_id: AggregateId,
        status: SlotStatus,
    },

    #[error("Slot {slot_id} is not held by booking {booking_id}")]
    NotHeldBy {
        slot_id: AggregateId,
        booking_id: AggregateId,
    },

    #[error("Invalid hourly rate: {0} (must not be negative)")]
    InvalidRate(Money),

    #[error("Slot number must not be empty")]
    EmptyNumber,

    #[error("Slot already registered: {0}")]
    AlreadyRegistered(AggregateId),
}

impl SlotError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SlotError::NotFound(_) => ErrorKind::NotFound,
            SlotError::Unavailable { .. } => ErrorKind::ResourceUnavailable,
            SlotError::DuplicateNumber(_) | SlotError::InvalidRate(_) | SlotError::EmptyNumber => {
                ErrorKind::Validation
            }
            SlotError::InUse { .. }
            | SlotError::NotHeldBy { .. }
            | SlotError::AlreadyRegistered(_) => ErrorKind::InvalidState,
        }
    }
}
