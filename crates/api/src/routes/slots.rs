//! Slot catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use domain::{Aggregate, Money, NewSlot, Slot, SlotDetails, SlotType};
use event_store::EventStore;
use serde::{Deserialize, Serialize};

use super::{AppState, parse_aggregate_id};
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateSlotRequest {
    pub slot_number: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub slot_type: SlotType,
    /// Zero or omitted: bill at the fee policy default.
    #[serde(default)]
    pub hourly_rate_cents: i64,
}

#[derive(Deserialize)]
pub struct UpdateSlotRequest {
    pub slot_number: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub slot_type: SlotType,
    /// Only applied when positive.
    #[serde(default)]
    pub hourly_rate_cents: i64,
}

#[derive(Deserialize)]
pub struct SetRateRequest {
    pub hourly_rate_cents: i64,
}

// -- Response types --

#[derive(Serialize)]
pub struct SlotResponse {
    pub id: String,
    pub slot_number: String,
    pub location: String,
    pub slot_type: SlotType,
    pub status: String,
    pub hourly_rate_cents: i64,
    pub booking_id: Option<String>,
    pub booked_by: Option<String>,
    pub window_start: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,
}

impl From<&Slot> for SlotResponse {
    fn from(slot: &Slot) -> Self {
        let window = slot.window();
        Self {
            id: slot.id().map(|id| id.to_string()).unwrap_or_default(),
            slot_number: slot.slot_number().to_string(),
            location: slot.location().to_string(),
            slot_type: slot.slot_type(),
            status: slot.status().to_string(),
            hourly_rate_cents: slot.hourly_rate().cents(),
            booking_id: slot.booking_id().map(|id| id.to_string()),
            booked_by: slot.booked_by().map(|id| id.to_string()),
            window_start: window.map(|(start, _)| start),
            window_end: window.map(|(_, end)| end),
        }
    }
}

// -- Handlers --

/// POST /slots
#[tracing::instrument(skip(state, req))]
pub async fn create<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateSlotRequest>,
) -> Result<(StatusCode, Json<SlotResponse>), ApiError> {
    let slot = NewSlot {
        slot_number: req.slot_number,
        location: req.location,
        slot_type: req.slot_type,
        hourly_rate: Money::from_cents(req.hourly_rate_cents),
    };
    let slot = state.engine.slots().create_slot(slot).await?;

    Ok((StatusCode::CREATED, Json(SlotResponse::from(&slot))))
}

/// GET /slots
#[tracing::instrument(skip(state))]
pub async fn list<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<SlotResponse>>, ApiError> {
    let slots = state.engine.slots().list_slots().await?;
    Ok(Json(slots.iter().map(SlotResponse::from).collect()))
}

/// GET /slots/available
#[tracing::instrument(skip(state))]
pub async fn list_available<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<SlotResponse>>, ApiError> {
    let slots = state.engine.slots().list_available().await?;
    Ok(Json(slots.iter().map(SlotResponse::from).collect()))
}

/// GET /slots/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<SlotResponse>, ApiError> {
    let slot_id = parse_aggregate_id(&id)?;
    let slot = state.engine.slots().get_slot(slot_id).await?;
    Ok(Json(SlotResponse::from(&slot)))
}

/// PUT /slots/{id}
#[tracing::instrument(skip(state, req))]
pub async fn update<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateSlotRequest>,
) -> Result<Json<SlotResponse>, ApiError> {
    let slot_id = parse_aggregate_id(&id)?;
    let details = SlotDetails {
        slot_number: req.slot_number,
        location: req.location,
        slot_type: req.slot_type,
        hourly_rate: Money::from_cents(req.hourly_rate_cents),
    };
    let slot = state.engine.slots().update_slot(slot_id, details).await?;
    Ok(Json(SlotResponse::from(&slot)))
}

/// PUT /slots/{id}/rate
#[tracing::instrument(skip(state, req))]
pub async fn set_rate<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<SetRateRequest>,
) -> Result<Json<SlotResponse>, ApiError> {
    let slot_id = parse_aggregate_id(&id)?;
    let slot = state
        .engine
        .slots()
        .set_slot_rate(slot_id, Money::from_cents(req.hourly_rate_cents))
        .await?;
    Ok(Json(SlotResponse::from(&slot)))
}

/// DELETE /slots/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let slot_id = parse_aggregate_id(&id)?;
    state.engine.slots().delete_slot(slot_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
