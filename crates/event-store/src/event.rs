use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AggregateId;

/// Unique identifier for a stored event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stream version used for optimistic concurrency control.
///
/// A stream with no events is at version 0; the first event is version 1.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Version of a stream that has no events yet.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Version carried by the first event of a stream.
    pub fn first() -> Self {
        Self(1)
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored event with the metadata needed to route and replay it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: EventId,

    /// Event name, e.g. `"SlotReserved"`.
    pub event_type: String,

    pub aggregate_id: AggregateId,

    /// Aggregate name, e.g. `"Slot"`, `"Booking"`.
    pub aggregate_type: String,

    /// Version of the stream after this event.
    pub version: Version,

    /// When the event was recorded.
    pub timestamp: DateTime<Utc>,

    pub payload: serde_json::Value,
}

impl EventEnvelope {
    /// Wraps a serializable event for the given stream position.
    pub fn new<T: Serialize>(
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        version: Version,
        event_type: impl Into<String>,
        event: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            event_id: EventId::new(),
            event_type: event_type.into(),
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            version,
            timestamp: Utc::now(),
            payload: serde_json::to_value(event)?,
        })
    }

    /// Deserializes the payload into a concrete event type.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_progression() {
        assert_eq!(Version::initial().as_i64(), 0);
        assert_eq!(Version::initial().next(), Version::first());
        assert!(Version::new(1) < Version::new(2));
    }

    #[test]
    fn envelope_decodes_its_payload() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Reserved {
            slot_number: String,
        }

        let event = Reserved {
            slot_number: "A-12".to_string(),
        };
        let envelope =
            EventEnvelope::new(AggregateId::new(), "Slot", Version::first(), "Reserved", &event)
                .unwrap();

        assert_eq!(envelope.aggregate_type, "Slot");
        assert_eq!(envelope.event_type, "Reserved");
        assert_eq!(envelope.decode::<Reserved>().unwrap(), event);
    }
}
