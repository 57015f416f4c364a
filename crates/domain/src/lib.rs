//! Domain layer of the parking reservation engine.
//!
//! This crate provides:
//! - `Aggregate`/`DomainEvent` traits and a retrying `CommandHandler`
//! - `FeePolicy` and its service (default rate and penalty)
//! - `Slot` and the `SlotRegistry` (availability state machine)
//! - `Booking` and the `BookingLedger` (lifecycle and charges)
//! - `Token` and the `TokenVault` (single-use verification codes)

pub mod aggregate;
pub mod booking;
pub mod command;
pub mod error;
pub mod fee;
pub mod slot;
pub mod token;

pub use aggregate::{Aggregate, DomainEvent};
pub use booking::{Booking, BookingError, BookingEvent, BookingLedger, BookingStatus};
pub use command::{CommandHandler, CommandResult, DEFAULT_MAX_ATTEMPTS};
pub use error::{DomainError, ErrorKind};
pub use fee::{FeeDefaults, FeePolicy, FeePolicyError, FeePolicyEvent, FeePolicyService, Money, ceil_hours};
pub use slot::{NewSlot, Slot, SlotDetails, SlotError, SlotEvent, SlotRegistry, SlotStatus, SlotType};
pub use token::{
    OsRngSecretGenerator, SecretGenerator, Token, TokenError, TokenEvent, TokenVault,
    DEFAULT_TOKEN_TTL_HOURS,
};
