//! Token issuance and redemption service.

use chrono::{DateTime, TimeDelta, Utc};
use common::AggregateId;
use event_store::{EventQuery, EventStore};

use crate::aggregate::Aggregate;
use crate::command::CommandHandler;
use crate::error::DomainError;

use super::{OsRngSecretGenerator, SecretGenerator, Token, TokenError, TokenEvent};

/// Lifetime of a token from issuance.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Issues and consumes single-use tokens.
///
/// A booking's token lives at a stream derived from the booking id, so the
/// conditional append that creates it also enforces one token per booking.
/// Redemption is a conditional append on the same stream, so of two
/// concurrent validations of one code exactly one succeeds.
pub struct TokenVault<S: EventStore> {
    handler: CommandHandler<S, Token>,
    generator: Box<dyn SecretGenerator>,
    ttl: TimeDelta,
}

impl<S: EventStore> TokenVault<S> {
    pub fn new(store: S) -> Self {
        Self::with_generator(store, OsRngSecretGenerator)
    }

    pub fn with_generator(store: S, generator: impl SecretGenerator + 'static) -> Self {
        Self {
            handler: CommandHandler::new(store),
            generator: Box::new(generator),
            ttl: TimeDelta::hours(DEFAULT_TOKEN_TTL_HOURS),
        }
    }

    pub fn with_ttl(mut self, ttl: TimeDelta) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.handler = self.handler.with_max_attempts(max_attempts);
        self
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// Issues the token of a booking, valid for the configured lifetime.
    pub async fn issue(&self, booking_id: AggregateId) -> Result<Token, DomainError> {
        self.issue_at(booking_id, Utc::now()).await
    }

    /// Issues the token as of `issued_at`.
    ///
    /// Codes are checked against previously issued tokens, but two issuances
    /// racing with the same code are not detected: uniqueness under
    /// concurrency rests on the secret source.
    #[tracing::instrument(skip(self))]
    pub async fn issue_at(
        &self,
        booking_id: AggregateId,
        issued_at: DateTime<Utc>,
    ) -> Result<Token, DomainError> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .filter(|expires_at| *expires_at > issued_at)
            .ok_or(TokenError::InvalidTtl { ttl: self.ttl })?;

        let code = self.generator.generate()?;
        if self.find_id_by_code(&code).await?.is_some() {
            tracing::error!(%booking_id, "secret source repeated an issued code");
            return Err(TokenError::DuplicateCode.into());
        }
        let token_id = Token::id_for_booking(booking_id);

        let result = self
            .handler
            .execute(token_id, |token| {
                token.issue(booking_id, code.clone(), issued_at, expires_at)
            })
            .await?;

        tracing::debug!(%expires_at, "token issued");
        Ok(result.aggregate)
    }

    /// Consumes the token with this code and returns its booking id.
    #[tracing::instrument(skip(self, code))]
    pub async fn validate(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<AggregateId, DomainError> {
        let token_id = self.find_id_by_code(code).await?.ok_or(TokenError::NotFound)?;

        let result = self
            .handler
            .execute(token_id, |token| token.redeem(now))
            .await?;

        let booking_id = result.aggregate.booking_id();
        tracing::debug!(%booking_id, "token redeemed");
        Ok(booking_id)
    }

    /// The token with this code, if any. Reading it does not consume it.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Token>, DomainError> {
        match self.find_id_by_code(code).await? {
            Some(token_id) => self.handler.load_existing(token_id).await,
            None => Ok(None),
        }
    }

    /// The token issued for a booking, if any.
    pub async fn find_by_booking(
        &self,
        booking_id: AggregateId,
    ) -> Result<Option<Token>, DomainError> {
        self.handler
            .load_existing(Token::id_for_booking(booking_id))
            .await
    }

    async fn find_id_by_code(&self, code: &str) -> Result<Option<AggregateId>, DomainError> {
        if code.is_empty() {
            return Ok(None);
        }

        let query = EventQuery::for_aggregate_type(Token::aggregate_type()).event_type("TokenIssued");
        for envelope in self.handler.store().query(query).await? {
            if let TokenEvent::TokenIssued(data) = envelope.decode::<TokenEvent>()?
                && data.code == code
            {
                return Ok(Some(data.token_id));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use event_store::InMemoryEventStore;
    use std::sync::Arc;

    struct FixedSecret(&'static str);

    impl SecretGenerator for FixedSecret {
        fn generate(&self) -> Result<String, TokenError> {
            Ok(self.0.to_string())
        }
    }

    struct BrokenSecret;

    impl SecretGenerator for BrokenSecret {
        fn generate(&self) -> Result<String, TokenError> {
            Err(TokenError::Generator("entropy source unavailable".into()))
        }
    }

    #[tokio::test]
    async fn issue_sets_expiry_from_ttl() {
        let vault = TokenVault::new(InMemoryEventStore::new());
        let booking_id = AggregateId::new();
        let now = Utc::now();

        let token = vault.issue_at(booking_id, now).await.unwrap();
        assert_eq!(token.booking_id(), booking_id);
        assert_eq!(token.expires_at(), now + TimeDelta::hours(24));
        assert_eq!(token.code().len(), 64);
        assert!(!token.is_used());

        let found = vault.find_by_booking(booking_id).await.unwrap().unwrap();
        assert_eq!(found.code(), token.code());
        assert!(vault.find_by_booking(AggregateId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn one_token_per_booking() {
        let vault = TokenVault::new(InMemoryEventStore::new());
        let booking_id = AggregateId::new();
        vault.issue(booking_id).await.unwrap();

        let err = vault.issue(booking_id).await.unwrap_err();
        assert!(matches!(err, DomainError::Token(TokenError::AlreadyIssued { .. })));
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn validate_is_single_use() {
        let vault = TokenVault::new(InMemoryEventStore::new());
        let booking_id = AggregateId::new();
        let token = vault.issue(booking_id).await.unwrap();

        let validated = vault.validate(token.code(), Utc::now()).await.unwrap();
        assert_eq!(validated, booking_id);

        let err = vault.validate(token.code(), Utc::now()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TokenAlreadyUsed);
    }

    #[tokio::test]
    async fn unknown_codes_are_not_found() {
        let vault = TokenVault::new(InMemoryEventStore::new());
        vault.issue(AggregateId::new()).await.unwrap();

        for code in ["", "deadbeef"] {
            let err = vault.validate(code, Utc::now()).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound);
        }
    }

    #[tokio::test]
    async fn custom_ttl_applies() {
        let vault = TokenVault::with_generator(InMemoryEventStore::new(), FixedSecret("abc123"))
            .with_ttl(TimeDelta::minutes(5));
        let now = Utc::now();
        vault.issue_at(AggregateId::new(), now).await.unwrap();

        let err = vault
            .validate("abc123", now + TimeDelta::minutes(6))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TokenExpired);
    }

    #[tokio::test]
    async fn generator_failure_is_a_dependency_failure() {
        let store = InMemoryEventStore::new();
        let vault = TokenVault::with_generator(store.clone(), BrokenSecret);

        let err = vault.issue(AggregateId::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DependencyFailure);
        assert_eq!(store.event_count().await, 0);
    }

    #[tokio::test]
    async fn repeated_codes_are_refused() {
        let store = InMemoryEventStore::new();
        let vault = TokenVault::with_generator(store.clone(), FixedSecret("same-code"));
        let first = AggregateId::new();
        vault.issue(first).await.unwrap();

        let err = vault.issue(AggregateId::new()).await.unwrap_err();
        assert!(matches!(err, DomainError::Token(TokenError::DuplicateCode)));
        assert_eq!(err.kind(), ErrorKind::DependencyFailure);
        assert_eq!(store.event_count().await, 1);

        // The code still belongs to the first booking only
        assert_eq!(vault.validate("same-code", Utc::now()).await.unwrap(), first);
    }

    #[tokio::test]
    async fn unusable_ttls_are_rejected_before_issuing() {
        let store = InMemoryEventStore::new();
        let now = Utc::now();

        for ttl in [
            TimeDelta::zero(),
            TimeDelta::hours(-1),
            TimeDelta::try_days(365_000_000).unwrap(),
        ] {
            let vault = TokenVault::new(store.clone()).with_ttl(ttl);
            let err = vault.issue_at(AggregateId::new(), now).await.unwrap_err();
            assert!(matches!(err, DomainError::Token(TokenError::InvalidTtl { .. })));
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
        assert_eq!(store.event_count().await, 0);
    }

    #[tokio::test]
    async fn find_by_code_leaves_the_token_unused() {
        let vault = TokenVault::new(InMemoryEventStore::new());
        let booking_id = AggregateId::new();
        let token = vault.issue(booking_id).await.unwrap();

        let found = vault.find_by_code(token.code()).await.unwrap().unwrap();
        assert_eq!(found.booking_id(), booking_id);
        assert!(!found.is_used());
        assert!(vault.find_by_code("unknown").await.unwrap().is_none());
        assert!(vault.find_by_code("").await.unwrap().is_none());

        vault.validate(token.code(), Utc::now()).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_validation_has_one_winner() {
        let vault = Arc::new(TokenVault::new(InMemoryEventStore::new()));
        let token = vault.issue(AggregateId::new()).await.unwrap();
        let code = token.code().to_string();

        let mut handles = Vec::new();
        for _ in 0..6 {
            let vault = vault.clone();
            let code = code.clone();
            handles.push(tokio::spawn(async move { vault.validate(&code, Utc::now()).await }));
        }

        let mut accepted = 0;
        let mut already_used = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(err) if err.kind() == ErrorKind::TokenAlreadyUsed => already_used += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(already_used, 5);
    }
}
