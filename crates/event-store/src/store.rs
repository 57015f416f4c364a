use async_trait::async_trait;

use crate::{AggregateId, EventEnvelope, EventQuery, EventStoreError, Result, Version};

/// Concurrency expectation attached to an append.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppendOptions {
    /// If set, the append only succeeds while the stream is at this version.
    pub expected_version: Option<Version>,
}

impl AppendOptions {
    /// No version check (last writer wins).
    pub fn any() -> Self {
        Self::default()
    }

    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// The stream must not exist yet.
    pub fn expect_new() -> Self {
        Self::expect_version(Version::initial())
    }
}

/// Persistence seam for every record of the engine.
///
/// Implementations must apply an append atomically: the version check and the
/// write of the whole batch happen as one step, so two callers racing on the
/// same stream see exactly one success.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends a batch of events belonging to a single stream.
    ///
    /// Returns the stream version after the append.
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version>;

    /// Returns the events of one stream, oldest first.
    async fn load(&self, aggregate_id: AggregateId) -> Result<Vec<EventEnvelope>>;

    /// Returns events across all streams matching the query, in append order.
    async fn query(&self, query: EventQuery) -> Result<Vec<EventEnvelope>>;

    /// Returns the version of a stream, or `None` if it has no events.
    async fn current_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>>;
}

/// Convenience methods available on every store.
#[async_trait]
pub trait EventStoreExt: EventStore {
    async fn append_one(&self, event: EventEnvelope, options: AppendOptions) -> Result<Version> {
        self.append(vec![event], options).await
    }

    async fn exists(&self, aggregate_id: AggregateId) -> Result<bool> {
        Ok(self.current_version(aggregate_id).await?.is_some())
    }
}

impl<T: EventStore + ?Sized> EventStoreExt for T {}

/// Checks that a batch targets one stream with consecutive versions.
///
/// Returns the stream id and the version the stream must be at before the
/// batch is written.
pub fn validate_batch(events: &[EventEnvelope]) -> Result<(AggregateId, Version)> {
    let first = events
        .first()
        .ok_or_else(|| EventStoreError::InvalidAppend("empty event batch".to_string()))?;

    let mut expected = first.version;
    for event in &events[1..] {
        if event.aggregate_id != first.aggregate_id {
            return Err(EventStoreError::InvalidAppend(
                "batch spans more than one stream".to_string(),
            ));
        }
        expected = expected.next();
        if event.version != expected {
            return Err(EventStoreError::InvalidAppend(format!(
                "versions must be consecutive: expected {expected}, got {}",
                event.version
            )));
        }
    }

    Ok((first.aggregate_id, Version::new(first.version.as_i64() - 1)))
}
