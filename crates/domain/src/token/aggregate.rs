//! Token aggregate implementation.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::Version;

use crate::aggregate::Aggregate;

use super::{
    TokenError, TokenEvent,
    events::{TokenIssuedData, TokenRedeemedData},
};

/// Verification token of one booking.
///
/// `used` flips from false to true exactly once.
#[derive(Debug, Clone, Default)]
pub struct Token {
    id: Option<AggregateId>,
    version: Version,
    booking_id: AggregateId,
    code: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    used: bool,
    used_at: Option<DateTime<Utc>>,
}

impl Aggregate for Token {
    type Event = TokenEvent;
    type Error = TokenError;

    fn aggregate_type() -> &'static str {
        "Token"
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
            TokenEvent::TokenIssued(data) => {
                self.id = Some(data.token_id);
                self.booking_id = data.booking_id;
                self.code = data.code;
                self.issued_at = data.issued_at;
                self.expires_at = data.expires_at;
            }
            TokenEvent::TokenRedeemed(data) => {
                self.used = true;
                self.used_at = Some(data.redeemed_at);
            }
        }
    }
}

impl Token {
    /// Stream id of the token belonging to a booking.
    pub fn id_for_booking(booking_id: AggregateId) -> AggregateId {
        booking_id.derive("token")
    }

    pub fn booking_id(&self) -> AggregateId {
        self.booking_id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_used(&self) -> bool {
        self.used
    }

    pub fn used_at(&self) -> Option<DateTime<Utc>> {
        self.used_at
    }

    pub fn issue(
        &self,
        booking_id: AggregateId,
        code: String,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<Vec<TokenEvent>, TokenError> {
        if self.id.is_some() {
            return Err(TokenError::AlreadyIssued { booking_id });
        }

        Ok(vec![TokenEvent::TokenIssued(TokenIssuedData {
            token_id: Self::id_for_booking(booking_id),
            booking_id,
            code,
            issued_at,
            expires_at,
        })])
    }

    /// Consumes the token. A used token reports `AlreadyUsed` even once it
    /// has also expired.
    pub fn redeem(&self, now: DateTime<Utc>) -> Result<Vec<TokenEvent>, TokenError> {
        if self.id.is_none() {
            return Err(TokenError::NotFound);
        }
        if self.used {
            return Err(TokenError::AlreadyUsed);
        }
        if now > self.expires_at {
            return Err(TokenError::Expired {
                expires_at: self.expires_at,
            });
        }

        Ok(vec![TokenEvent::TokenRedeemed(TokenRedeemedData {
            redeemed_at: now,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn issued(now: DateTime<Utc>) -> Token {
        let mut token = Token::default();
        let events = token
            .issue(AggregateId::new(), "c0ffee".into(), now, now + TimeDelta::hours(24))
            .unwrap();
        token.apply_events(events);
        token
    }

    #[test]
    fn token_id_follows_booking() {
        let booking_id = AggregateId::new();
        assert_eq!(Token::id_for_booking(booking_id), Token::id_for_booking(booking_id));
        assert_ne!(Token::id_for_booking(booking_id), booking_id);
    }

    #[test]
    fn second_issue_is_rejected() {
        let now = Utc::now();
        let token = issued(now);
        assert!(matches!(
            token.issue(token.booking_id(), "other".into(), now, now),
            Err(TokenError::AlreadyIssued { .. })
        ));
    }

    #[test]
    fn redeem_flips_used_once() {
        let now = Utc::now();
        let mut token = issued(now);

        let events = token.redeem(now).unwrap();
        token.apply_events(events);
        assert!(token.is_used());
        assert_eq!(token.used_at(), Some(now));

        assert!(matches!(token.redeem(now), Err(TokenError::AlreadyUsed)));
    }

    #[test]
    fn redeem_after_expiry_fails() {
        let now = Utc::now();
        let token = issued(now);

        assert!(token.redeem(now + TimeDelta::hours(24)).is_ok());
        assert!(matches!(
            token.redeem(now + TimeDelta::hours(24) + TimeDelta::seconds(1)),
            Err(TokenError::Expired { .. })
        ));
    }
}
