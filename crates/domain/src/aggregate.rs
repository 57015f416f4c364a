//! Core aggregate and domain event traits.

use common::AggregateId;
use event_store::Version;
use serde::{Serialize, de::DeserializeOwned};

/// A fact recorded on an aggregate's stream, named in past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Event name stored alongside the payload; used for queries.
    fn event_type(&self) -> &'static str;
}

/// An event-sourced record.
///
/// State is rebuilt by replaying events through `apply`. Commands are plain
/// methods on the aggregate that inspect the current state and return the
/// events to record, or an error if the transition is not allowed.
pub trait Aggregate: Default + Send + Sync + Sized {
    type Event: DomainEvent;

    type Error: std::error::Error + Send + Sync;

    /// Aggregate name, stored with every event.
    fn aggregate_type() -> &'static str;

    /// Returns None until the creating event has been applied.
    fn id(&self) -> Option<AggregateId>;

    fn version(&self) -> Version;

    fn set_version(&mut self, version: Version);

    /// Applies an event. Must be pure and infallible: events are facts.
    fn apply(&mut self, event: Self::Event);

    fn apply_events(&mut self, events: impl IntoIterator<Item = Self::Event>) {
        for event in events {
            self.apply(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    enum CounterEvent {
        Opened { id: AggregateId },
        Bumped,
    }

    impl DomainEvent for CounterEvent {
        fn event_type(&self) -> &'static str {
            match self {
                CounterEvent::Opened { .. } => "CounterOpened",
                CounterEvent::Bumped => "CounterBumped",
            }
        }
    }

    #[derive(Debug, Default)]
    struct Counter {
        id: Option<AggregateId>,
        count: u32,
        version: Version,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("counter error")]
    struct CounterError;

    impl Aggregate for Counter {
        type Event = CounterEvent;
        type Error = CounterError;

        fn aggregate_type() -> &'static str {
            "Counter"
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
                CounterEvent::Opened { id } => self.id = Some(id),
                CounterEvent::Bumped => self.count += 1,
            }
        }
    }

    #[test]
    fn replaying_events_rebuilds_state() {
        let id = AggregateId::new();
        let mut counter = Counter::default();
        counter.apply_events([CounterEvent::Opened { id }, CounterEvent::Bumped, CounterEvent::Bumped]);

        assert_eq!(counter.id(), Some(id));
        assert_eq!(counter.count, 2);
    }

    #[test]
    fn event_type_names() {
        assert_eq!(CounterEvent::Bumped.event_type(), "CounterBumped");
        assert_eq!(
            CounterEvent::Opened { id: AggregateId::new() }.event_type(),
            "CounterOpened"
        );
    }
}
