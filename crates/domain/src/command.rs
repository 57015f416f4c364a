//! Command execution against event-sourced aggregates.

use std::marker::PhantomData;

use common::AggregateId;
use event_store::{AppendOptions, EventEnvelope, EventStore, EventStoreError, Version};

use crate::aggregate::{Aggregate, DomainEvent};
use crate::error::DomainError;

/// Attempts made before a contended command gives up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// The aggregate after applying the new events.
    pub aggregate: A,

    /// The events that were persisted.
    pub events: Vec<A::Event>,

    pub new_version: Version,
}

/// Runs commands against one aggregate type.
///
/// Each attempt loads the aggregate, lets the command decide which events to
/// record, and appends them conditional on the loaded version. If another
/// writer got there first the append conflicts and the command is re-run on
/// the fresh state, so the loser sees the winner's outcome as a domain error.
pub struct CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    store: S,
    max_attempts: u32,
    _phantom: PhantomData<A>,
}

impl<S, A> CommandHandler<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            _phantom: PhantomData,
        }
    }

    /// Sets how many conflicting attempts are tolerated (at least one).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads an aggregate by replaying its stream.
    ///
    /// An unknown id yields a default (uninitialized) instance.
    pub async fn load(&self, aggregate_id: AggregateId) -> Result<A, DomainError> {
        let envelopes = self.store.load(aggregate_id).await?;

        let mut aggregate = A::default();
        for envelope in envelopes {
            let event: A::Event = envelope.decode()?;
            aggregate.apply(event);
            aggregate.set_version(envelope.version);
        }

        Ok(aggregate)
    }

    /// Loads an aggregate, returning None if it was never created.
    pub async fn load_existing(&self, aggregate_id: AggregateId) -> Result<Option<A>, DomainError> {
        let aggregate = self.load(aggregate_id).await?;
        Ok(aggregate.id().is_some().then_some(aggregate))
    }

    /// Executes a command and persists the resulting events.
    ///
    /// The command may run more than once, so it must not have side effects.
    pub async fn execute<F>(
        &self,
        aggregate_id: AggregateId,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        F: Fn(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let mut attempt = 1;
        loop {
            match self.try_execute(aggregate_id, &command_fn).await {
                Err(DomainError::EventStore(EventStoreError::ConcurrencyConflict { .. })) => {
                    if attempt >= self.max_attempts {
                        return Err(DomainError::ContentionExhausted {
                            aggregate_type: A::aggregate_type(),
                            aggregate_id,
                            attempts: attempt,
                        });
                    }
                    metrics::counter!("command_retries_total", "aggregate" => A::aggregate_type())
                        .increment(1);
                    tracing::debug!(%aggregate_id, attempt, "version conflict, retrying command");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn try_execute<F>(
        &self,
        aggregate_id: AggregateId,
        command_fn: &F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        F: Fn(&A) -> Result<Vec<A::Event>, A::Error>,
        DomainError: From<A::Error>,
    {
        let mut aggregate = self.load(aggregate_id).await?;
        let current_version = aggregate.version();

        let events = command_fn(&aggregate)?;
        if events.is_empty() {
            return Ok(CommandResult {
                aggregate,
                events,
                new_version: current_version,
            });
        }

        let envelopes = self.build_envelopes(aggregate_id, current_version, &events)?;
        let new_version = self
            .store
            .append(envelopes, AppendOptions::expect_version(current_version))
            .await?;

        aggregate.apply_events(events.iter().cloned());
        aggregate.set_version(new_version);

        Ok(CommandResult {
            aggregate,
            events,
            new_version,
        })
    }

    fn build_envelopes(
        &self,
        aggregate_id: AggregateId,
        current_version: Version,
        events: &[A::Event],
    ) -> Result<Vec<EventEnvelope>, DomainError> {
        let mut version = current_version;
        events
            .iter()
            .map(|event| {
                version = version.next();
                EventEnvelope::new(
                    aggregate_id,
                    A::aggregate_type(),
                    version,
                    event.event_type(),
                    event,
                )
                .map_err(DomainError::from)
            })
            .collect()
    }
}
