use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::store::{AppendOptions, EventStore, validate_batch};
use crate::{AggregateId, EventEnvelope, EventQuery, EventStoreError, Result, Version};

#[derive(Default)]
struct MemoryState {
    /// Every event in append order.
    log: Vec<EventEnvelope>,
    /// Positions in `log` per stream.
    streams: HashMap<AggregateId, Vec<usize>>,
}

impl MemoryState {
    fn version_of(&self, aggregate_id: AggregateId) -> Version {
        self.streams
            .get(&aggregate_id)
            .and_then(|positions| positions.last())
            .map(|&pos| self.log[pos].version)
            .unwrap_or_default()
    }
}

/// Event store held in process memory.
///
/// Clones share the same state, so one instance can be handed to every
/// component of the engine.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of events stored.
    pub async fn event_count(&self) -> usize {
        self.state.read().await.log.len()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        let (aggregate_id, before) = validate_batch(&events)?;

        // The write lock makes the version check and the insert one step.
        let mut state = self.state.write().await;
        let current = state.version_of(aggregate_id);

        if let Some(expected) = options.expected_version
            && current != expected
        {
            metrics::counter!("event_store_conflicts_total").increment(1);
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual: current,
            });
        }
        if before != current {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected: before,
                actual: current,
            });
        }

        let last = events.last().map(|e| e.version).unwrap_or(current);
        let start = state.log.len();
        let count = events.len();
        state.log.extend(events);
        state
            .streams
            .entry(aggregate_id)
            .or_default()
            .extend(start..start + count);

        tracing::trace!(%aggregate_id, version = %last, count, "events appended");
        Ok(last)
    }

    async fn load(&self, aggregate_id: AggregateId) -> Result<Vec<EventEnvelope>> {
        let state = self.state.read().await;
        Ok(state
            .streams
            .get(&aggregate_id)
            .map(|positions| positions.iter().map(|&pos| state.log[pos].clone()).collect())
            .unwrap_or_default())
    }

    async fn query(&self, query: EventQuery) -> Result<Vec<EventEnvelope>> {
        let state = self.state.read().await;
        let matching = state.log.iter().filter(|e| query.matches(e)).cloned();
        Ok(match query.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        })
    }

    async fn current_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>> {
        let state = self.state.read().await;
        Ok(state.streams.contains_key(&aggregate_id).then(|| state.version_of(aggregate_id)))
    }
}
