//! Token domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

/// Events that can occur on a token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TokenEvent {
    TokenIssued(TokenIssuedData),

    /// The code was presented and accepted. Recorded at most once.
    TokenRedeemed(TokenRedeemedData),
}

impl DomainEvent for TokenEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TokenEvent::TokenIssued(_) => "TokenIssued",
            TokenEvent::TokenRedeemed(_) => "TokenRedeemed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenIssuedData {
    pub token_id: AggregateId,
    pub booking_id: AggregateId,
    pub code: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRedeemedData {
    pub redeemed_at: DateTime<Utc>,
}
