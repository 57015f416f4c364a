//! One-shot wiring of the reservation components.

use std::sync::Arc;

use chrono::TimeDelta;
use domain::{
    BookingLedger, DEFAULT_MAX_ATTEMPTS, DEFAULT_TOKEN_TTL_HOURS, FeeDefaults, FeePolicyService,
    OsRngSecretGenerator, SecretGenerator, SlotRegistry, TokenVault,
};
use event_store::EventStore;

use crate::orchestrator::ReservationOrchestrator;

/// Tunables shared by every component.
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    /// Used until a fee policy is recorded.
    pub fee_defaults: FeeDefaults,
    pub token_ttl: TimeDelta,
    /// Attempts per command before a contended write gives up.
    pub max_attempts: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            fee_defaults: FeeDefaults::default(),
            token_ttl: TimeDelta::hours(DEFAULT_TOKEN_TTL_HOURS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Every component, built once over one store and shared by handle.
pub struct ReservationEngine<S: EventStore> {
    fee_policy: Arc<FeePolicyService<S>>,
    slots: Arc<SlotRegistry<S>>,
    ledger: Arc<BookingLedger<S>>,
    tokens: Arc<TokenVault<S>>,
    orchestrator: Arc<ReservationOrchestrator<S>>,
}

impl<S: EventStore + Clone> ReservationEngine<S> {
    pub fn new(store: S, settings: EngineSettings) -> Self {
        Self::with_generator(store, settings, OsRngSecretGenerator)
    }

    /// Builds the engine with a custom secret source for tokens.
    pub fn with_generator(
        store: S,
        settings: EngineSettings,
        generator: impl SecretGenerator + 'static,
    ) -> Self {
        let fee_policy = Arc::new(
            FeePolicyService::new(store.clone(), settings.fee_defaults)
                .with_max_attempts(settings.max_attempts),
        );
        let slots = Arc::new(
            SlotRegistry::new(store.clone(), fee_policy.clone())
                .with_max_attempts(settings.max_attempts),
        );
        let ledger = Arc::new(
            BookingLedger::new(store.clone(), slots.clone(), fee_policy.clone())
                .with_max_attempts(settings.max_attempts),
        );
        let tokens = Arc::new(
            TokenVault::with_generator(store, generator)
                .with_ttl(settings.token_ttl)
                .with_max_attempts(settings.max_attempts),
        );
        let orchestrator = Arc::new(ReservationOrchestrator::new(
            ledger.clone(),
            tokens.clone(),
            slots.clone(),
        ));

        tracing::debug!(?settings, "reservation engine wired");
        Self {
            fee_policy,
            slots,
            ledger,
            tokens,
            orchestrator,
        }
    }
}

impl<S: EventStore> ReservationEngine<S> {
    pub fn fee_policy(&self) -> &Arc<FeePolicyService<S>> {
        &self.fee_policy
    }

    pub fn slots(&self) -> &Arc<SlotRegistry<S>> {
        &self.slots
    }

    pub fn ledger(&self) -> &Arc<BookingLedger<S>> {
        &self.ledger
    }

    pub fn tokens(&self) -> &Arc<TokenVault<S>> {
        &self.tokens
    }

    pub fn orchestrator(&self) -> &Arc<ReservationOrchestrator<S>> {
        &self.orchestrator
    }
}

impl<S: EventStore> Clone for ReservationEngine<S> {
    fn clone(&self) -> Self {
        Self {
            fee_policy: self.fee_policy.clone(),
            slots: self.slots.clone(),
            ledger: self.ledger.clone(),
            tokens: self.tokens.clone(),
            orchestrator: self.orchestrator.clone(),
        }
    }
}
