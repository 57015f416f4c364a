//! Token validation endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use chrono::{DateTime, Utc};
use event_store::EventStore;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct ValidateTokenRequest {
    pub code: String,
    /// Validation instant; defaults to the current time.
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct ValidateTokenResponse {
    pub booking_id: String,
}

/// POST /tokens/validate
///
/// Consumes the code and checks its booking in.
#[tracing::instrument(skip(state, req))]
pub async fn validate<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<ValidateTokenRequest>,
) -> Result<Json<ValidateTokenResponse>, ApiError> {
    let now = req.now.unwrap_or_else(Utc::now);
    let booking_id = state
        .engine
        .orchestrator()
        .validate_token(&req.code, now)
        .await?;

    Ok(Json(ValidateTokenResponse {
        booking_id: booking_id.to_string(),
    }))
}
