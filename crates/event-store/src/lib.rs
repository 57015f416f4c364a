//! Append-only event store.
//!
//! Every slot, booking, token and fee-policy change is persisted as an event on
//! the stream of its aggregate. Appends are conditional on the stream version,
//! which is what makes check-then-write sequences atomic for callers.

pub mod error;
pub mod event;
pub mod memory;
pub mod query;
pub mod store;

pub use common::AggregateId;
pub use error::{EventStoreError, Result};
pub use event::{EventEnvelope, EventId, Version};
pub use memory::InMemoryEventStore;
pub use query::EventQuery;
pub use store::{AppendOptions, EventStore, EventStoreExt};
