//! Single-use verification tokens bound to a booking.

mod aggregate;
mod events;
mod generator;
mod vault;

pub use aggregate::Token;
pub use events::{TokenEvent, TokenIssuedData, TokenRedeemedData};
pub use generator::{OsRngSecretGenerator, SECRET_BYTES, SecretGenerator};
pub use vault::{DEFAULT_TOKEN_TTL_HOURS, TokenVault};

use chrono::{DateTime, TimeDelta, Utc};
use common::AggregateId;
use thiserror::Error;

use crate::error::ErrorKind;

/// Errors that can occur during token operations.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token not found")]
    NotFound,

    #[error("A token was already issued for booking {booking_id}")]
    AlreadyIssued { booking_id: AggregateId },

    #[error("Token already used")]
    AlreadyUsed,

    #[error("Token expired at {expires_at}")]
    Expired { expires_at: DateTime<Utc> },

    #[error("Secret generation failed: {0}")]
    Generator(String),

    /// The secret source produced a code that is already in use.
    #[error("Generated token code is already in use")]
    DuplicateCode,

    #[error("Token lifetime {ttl} must be positive and representable")]
    InvalidTtl { ttl: TimeDelta },
}

impl TokenError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TokenError::NotFound => ErrorKind::NotFound,
            TokenError::AlreadyIssued { .. } => ErrorKind::InvalidState,
            TokenError::AlreadyUsed => ErrorKind::TokenAlreadyUsed,
            TokenError::Expired { .. } => ErrorKind::TokenExpired,
            TokenError::Generator(_) | TokenError::DuplicateCode => ErrorKind::DependencyFailure,
            TokenError::InvalidTtl { .. } => ErrorKind::Validation,
        }
    }
}
