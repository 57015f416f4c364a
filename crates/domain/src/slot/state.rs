//! Slot availability state machine.

use serde::{Deserialize, Serialize};

/// Availability of a slot.
///
/// State transitions:
/// ```text
/// Available ──reserve──► Reserved ──occupy──► Occupied
///     ▲                     │                    │
///     └───────release───────┴────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotStatus {
    #[default]
    Available,

    /// Held by an active booking, vehicle not yet checked in.
    Reserved,

    /// Held by an active booking whose token was validated at entry.
    Occupied,
}

impl SlotStatus {
    pub fn can_reserve(&self) -> bool {
        matches!(self, SlotStatus::Available)
    }

    pub fn can_occupy(&self) -> bool {
        matches!(self, SlotStatus::Reserved)
    }

    /// Returns true while an active booking holds the slot.
    pub fn is_held(&self) -> bool {
        matches!(self, SlotStatus::Reserved | SlotStatus::Occupied)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Available => "AVAILABLE",
            SlotStatus::Reserved => "RESERVED",
            SlotStatus::Occupied => "OCCUPIED",
        }
    }
}

impl std::fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of parking space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotType {
    #[default]
    Regular,
    Vip,
    Handicapped,
}

impl SlotType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotType::Regular => "REGULAR",
            SlotType::Vip => "VIP",
            SlotType::Handicapped => "HANDICAPPED",
        }
    }
}

impl std::fmt::Display for SlotType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
