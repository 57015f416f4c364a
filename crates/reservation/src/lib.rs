//! Reservation orchestration for the parking engine.
//!
//! A reservation is two steps:
//! 1. Create the booking (which claims the slot)
//! 2. Issue the booking's verification token
//!
//! If the second step fails, the booking is cancelled so the slot is not
//! left held by a booking nobody can check in with.

pub mod engine;
pub mod error;
pub mod orchestrator;

pub use engine::{EngineSettings, ReservationEngine};
pub use error::{ReservationError, Result};
pub use orchestrator::{Reservation, ReservationOrchestrator};
