//! Fee policy endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use chrono::{DateTime, Utc};
use domain::{FeePolicy, Money};
use event_store::EventStore;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct UpdateFeePolicyRequest {
    pub default_hourly_rate_cents: i64,
    pub default_penalty_cents: i64,
}

#[derive(Serialize)]
pub struct FeePolicyResponse {
    pub default_hourly_rate_cents: i64,
    pub default_penalty_cents: i64,
    /// None while the configured defaults are in effect.
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&FeePolicy> for FeePolicyResponse {
    fn from(policy: &FeePolicy) -> Self {
        Self {
            default_hourly_rate_cents: policy.default_hourly_rate().cents(),
            default_penalty_cents: policy.default_penalty().cents(),
            updated_at: policy.updated_at(),
        }
    }
}

/// GET /fee-policy
#[tracing::instrument(skip(state))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<FeePolicyResponse>, ApiError> {
    let policy = state.engine.fee_policy().current().await?;
    Ok(Json(FeePolicyResponse::from(&policy)))
}

/// PUT /fee-policy
#[tracing::instrument(skip(state, req))]
pub async fn update<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<UpdateFeePolicyRequest>,
) -> Result<Json<FeePolicyResponse>, ApiError> {
    let policy = state
        .engine
        .fee_policy()
        .update(
            Money::from_cents(req.default_hourly_rate_cents),
            Money::from_cents(req.default_penalty_cents),
        )
        .await?;
    Ok(Json(FeePolicyResponse::from(&policy)))
}
