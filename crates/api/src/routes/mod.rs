//! HTTP handlers, one module per resource.

pub mod bookings;
pub mod fee_policy;
pub mod health;
pub mod metrics;
pub mod slots;
pub mod tokens;

use common::{AggregateId, UserId};
use event_store::EventStore;
use reservation::ReservationEngine;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: EventStore> {
    pub engine: ReservationEngine<S>,
}

fn parse_aggregate_id(id: &str) -> Result<AggregateId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}

fn parse_user_id(id: &str) -> Result<UserId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid user_id: {e}")))
}
