//! Fee policy service.

use chrono::Utc;
use event_store::EventStore;

use crate::command::CommandHandler;
use crate::error::DomainError;

use super::{FeeDefaults, FeePolicy, Money};

/// Reads and records the process-wide fee policy.
pub struct FeePolicyService<S: EventStore> {
    handler: CommandHandler<S, FeePolicy>,
    defaults: FeeDefaults,
}

impl<S: EventStore> FeePolicyService<S> {
    pub fn new(store: S, defaults: FeeDefaults) -> Self {
        Self {
            handler: CommandHandler::new(store),
            defaults,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.handler = self.handler.with_max_attempts(max_attempts);
        self
    }

    /// Returns the recorded policy, or the configured defaults if none exists.
    pub async fn current(&self) -> Result<FeePolicy, DomainError> {
        Ok(self
            .handler
            .load_existing(FeePolicy::policy_id())
            .await?
            .unwrap_or_else(|| FeePolicy::from_defaults(self.defaults)))
    }

    /// Records a new default hourly rate and penalty.
    #[tracing::instrument(skip(self))]
    pub async fn update(
        &self,
        default_hourly_rate: Money,
        default_penalty: Money,
    ) -> Result<FeePolicy, DomainError> {
        let now = Utc::now();
        let result = self
            .handler
            .execute(FeePolicy::policy_id(), |policy| {
                policy.update(default_hourly_rate, default_penalty, now)
            })
            .await?;

        tracing::info!("fee policy updated");
        Ok(result.aggregate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_store::InMemoryEventStore;

    #[tokio::test]
    async fn current_falls_back_to_defaults() {
        let service = FeePolicyService::new(InMemoryEventStore::new(), FeeDefaults::default());

        let policy = service.current().await.unwrap();
        assert_eq!(policy.default_hourly_rate(), Money::from_units(10));
        assert_eq!(policy.default_penalty(), Money::from_units(50));
        assert!(policy.updated_at().is_none());
    }

    #[tokio::test]
    async fn updates_replace_defaults() {
        let service = FeePolicyService::new(InMemoryEventStore::new(), FeeDefaults::default());

        service
            .update(Money::from_units(15), Money::from_units(75))
            .await
            .unwrap();
        let policy = service
            .update(Money::from_units(20), Money::from_units(80))
            .await
            .unwrap();
        assert_eq!(policy.default_hourly_rate(), Money::from_units(20));

        let current = service.current().await.unwrap();
        assert_eq!(current.default_hourly_rate(), Money::from_units(20));
        assert_eq!(current.default_penalty(), Money::from_units(80));
        assert!(current.updated_at().is_some());
    }

    #[tokio::test]
    async fn invalid_update_keeps_previous_policy() {
        let service = FeePolicyService::new(InMemoryEventStore::new(), FeeDefaults::default());

        let result = service.update(Money::from_cents(-100), Money::zero()).await;
        assert!(matches!(result, Err(DomainError::FeePolicy(_))));

        let current = service.current().await.unwrap();
        assert_eq!(current.default_hourly_rate(), Money::from_units(10));
    }
}
