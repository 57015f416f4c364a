//! Reservation and booking endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use domain::{Aggregate, Booking, Token};
use event_store::EventStore;
use reservation::Reservation;
use serde::{Deserialize, Serialize};

use super::{AppState, parse_aggregate_id, parse_user_id};
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateReservationRequest {
    pub user_id: String,
    pub slot_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Overrides the completion instant; defaults to the current time.
#[derive(Deserialize, Default)]
pub struct CompleteParams {
    pub now: Option<DateTime<Utc>>,
}

// -- Response types --

#[derive(Serialize)]
pub struct BookingResponse {
    pub id: String,
    pub user_id: String,
    pub slot_id: String,
    pub status: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub hourly_rate_cents: i64,
    pub booking_amount_cents: i64,
    pub penalty_applied: bool,
    pub overstay_hours: i64,
    pub penalty_amount_cents: i64,
    pub total_amount_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Booking> for BookingResponse {
    fn from(booking: &Booking) -> Self {
        Self {
            id: booking.id().map(|id| id.to_string()).unwrap_or_default(),
            user_id: booking.user_id().to_string(),
            slot_id: booking.slot_id().to_string(),
            status: booking.status().to_string(),
            start_time: booking.start_time(),
            end_time: booking.end_time(),
            hourly_rate_cents: booking.hourly_rate().cents(),
            booking_amount_cents: booking.booking_amount().cents(),
            penalty_applied: booking.penalty_applied(),
            overstay_hours: booking.overstay_hours(),
            penalty_amount_cents: booking.penalty_amount().cents(),
            total_amount_cents: booking.total_amount().cents(),
            created_at: booking.created_at(),
            updated_at: booking.updated_at(),
        }
    }
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub code: String,
    pub booking_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

impl From<&Token> for TokenResponse {
    fn from(token: &Token) -> Self {
        Self {
            code: token.code().to_string(),
            booking_id: token.booking_id().to_string(),
            issued_at: token.issued_at(),
            expires_at: token.expires_at(),
            used: token.is_used(),
        }
    }
}

#[derive(Serialize)]
pub struct ReservationResponse {
    pub booking: BookingResponse,
    pub token: TokenResponse,
}

impl From<&Reservation> for ReservationResponse {
    fn from(reservation: &Reservation) -> Self {
        Self {
            booking: BookingResponse::from(&reservation.booking),
            token: TokenResponse::from(&reservation.token),
        }
    }
}

// -- Handlers --

/// POST /reservations
#[tracing::instrument(skip(state, req))]
pub async fn create<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateReservationRequest>,
) -> Result<(StatusCode, Json<ReservationResponse>), ApiError> {
    let user_id = parse_user_id(&req.user_id)?;
    let slot_id = parse_aggregate_id(&req.slot_id)?;

    let reservation = state
        .engine
        .orchestrator()
        .create_reservation(user_id, slot_id, req.start_time, req.end_time)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReservationResponse::from(&reservation)),
    ))
}

/// GET /bookings/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking_id = parse_aggregate_id(&id)?;
    let booking = state.engine.orchestrator().get_booking(booking_id).await?;
    Ok(Json(BookingResponse::from(&booking)))
}

/// GET /bookings/{id}/token
#[tracing::instrument(skip(state))]
pub async fn token<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<TokenResponse>, ApiError> {
    let booking_id = parse_aggregate_id(&id)?;
    let token = state
        .engine
        .orchestrator()
        .find_token(booking_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no token issued for booking {booking_id}")))?;
    Ok(Json(TokenResponse::from(&token)))
}

/// POST /bookings/{id}/cancel
#[tracing::instrument(skip(state))]
pub async fn cancel<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking_id = parse_aggregate_id(&id)?;
    let booking = state
        .engine
        .orchestrator()
        .cancel_reservation(booking_id)
        .await?;
    Ok(Json(BookingResponse::from(&booking)))
}

/// POST /bookings/{id}/complete
#[tracing::instrument(skip(state, params))]
pub async fn complete<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Query(params): Query<CompleteParams>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking_id = parse_aggregate_id(&id)?;
    let now = params.now.unwrap_or_else(Utc::now);
    let booking = state
        .engine
        .orchestrator()
        .complete_and_release(booking_id, now)
        .await?;
    Ok(Json(BookingResponse::from(&booking)))
}

/// GET /users/{id}/bookings
#[tracing::instrument(skip(state))]
pub async fn list_by_user<S: EventStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let user_id = parse_user_id(&id)?;
    let bookings = state
        .engine
        .orchestrator()
        .list_bookings_by_user(user_id)
        .await?;
    Ok(Json(bookings.iter().map(BookingResponse::from).collect()))
}
