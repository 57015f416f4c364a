//! Domain error types.

use common::AggregateId;
use event_store::EventStoreError;
use thiserror::Error;

use crate::booking::BookingError;
use crate::fee::FeePolicyError;
use crate::slot::SlotError;
use crate::token::TokenError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    #[error("Slot error: {0}")]
    Slot(#[from] SlotError),

    #[error("Booking error: {0}")]
    Booking(#[from] BookingError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Fee policy error: {0}")]
    FeePolicy(#[from] FeePolicyError),

    /// Every attempt lost a version race against another writer.
    #[error("Gave up on {aggregate_type} {aggregate_id} after {attempts} conflicting attempts")]
    ContentionExhausted {
        aggregate_type: &'static str,
        aggregate_id: AggregateId,
        attempts: u32,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Classifies the error for callers that map failures onto a transport.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Slot(err) => err.kind(),
            DomainError::Booking(err) => err.kind(),
            DomainError::Token(err) => err.kind(),
            DomainError::FeePolicy(_) => ErrorKind::Validation,
            DomainError::EventStore(_)
            | DomainError::ContentionExhausted { .. }
            | DomainError::Serialization(_) => ErrorKind::DependencyFailure,
        }
    }
}

/// Failure classes every operation reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input, rejected before any state change.
    Validation,
    /// Slot, booking or token unknown.
    NotFound,
    /// Operation not permitted in the record's current status.
    InvalidState,
    /// Slot not available at reservation time.
    ResourceUnavailable,
    TokenExpired,
    TokenAlreadyUsed,
    /// A collaborator (store, secret source, slot release) failed.
    DependencyFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::InvalidState => "InvalidState",
            ErrorKind::ResourceUnavailable => "ResourceUnavailable",
            ErrorKind::TokenExpired => "TokenExpired",
            ErrorKind::TokenAlreadyUsed => "TokenAlreadyUsed",
            ErrorKind::DependencyFailure => "DependencyFailure",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::SlotStatus;
    use chrono::Utc;

    #[test]
    fn kinds_follow_the_failure_taxonomy() {
        let id = AggregateId::new();

        assert_eq!(DomainError::from(SlotError::NotFound(id)).kind(), ErrorKind::NotFound);
        assert_eq!(
            DomainError::from(SlotError::Unavailable {
                slot_id: id,
                status: SlotStatus::Reserved
            })
            .kind(),
            ErrorKind::ResourceUnavailable
        );
        assert_eq!(
            DomainError::from(SlotError::DuplicateNumber("A-1".into())).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            DomainError::from(TokenError::AlreadyIssued { booking_id: id }).kind(),
            ErrorKind::InvalidState
        );
        assert_eq!(
            DomainError::from(TokenError::Expired { expires_at: Utc::now() }).kind(),
            ErrorKind::TokenExpired
        );
        assert_eq!(
            DomainError::from(TokenError::AlreadyUsed).kind(),
            ErrorKind::TokenAlreadyUsed
        );
        assert_eq!(
            DomainError::from(EventStoreError::Unavailable("down".into())).kind(),
            ErrorKind::DependencyFailure
        );
    }

    #[test]
    fn kind_display_names() {
        assert_eq!(ErrorKind::Validation.to_string(), "ValidationError");
        assert_eq!(ErrorKind::ResourceUnavailable.to_string(), "ResourceUnavailable");
    }
}
