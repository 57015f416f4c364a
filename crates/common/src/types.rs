use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of an event-sourced record (slot, booking, token, fee policy).
///
/// Opaque to callers; the event store keys every stream by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateId(Uuid);

impl AggregateId {
    /// Creates a new random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Derives a stable id from this one and a name.
    ///
    /// The same `(self, name)` pair always yields the same id, which lets a
    /// dependent record (e.g. the token of a booking) live at a predictable
    /// stream.
    pub fn derive(&self, name: &str) -> Self {
        Self(Uuid::new_v5(&self.0, name.as_bytes()))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AggregateId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AggregateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AggregateId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for AggregateId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Reference to a user owned by the external identity service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(AggregateId::new(), AggregateId::new());
        assert_ne!(UserId::new(), UserId::new());
    }

    #[test]
    fn derived_id_is_stable_and_distinct_from_parent() {
        let booking = AggregateId::new();
        let a = booking.derive("token");
        let b = booking.derive("token");
        assert_eq!(a, b);
        assert_ne!(a, booking);
        assert_ne!(a, booking.derive("other"));
    }

    #[test]
    fn ids_parse_from_their_display_form() {
        let id = AggregateId::new();
        let parsed: AggregateId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);

        assert!("not-a-uuid".parse::<UserId>().is_err());
    }

    #[test]
    fn user_id_serializes_as_bare_uuid() {
        let user = UserId::new();
        let json = serde_json::to_string(&user).unwrap();
        assert_eq!(json, format!("\"{}\"", user.as_uuid()));
    }
}
