//! Booking, cancellation, and booking lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use common::CustomerId;
use domain::{BookingInfo, BookingRequest, CancelRequest};
use seat_store::SeatStore;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct BookRequestBody {
    pub customer: String,
    #[serde(default)]
    pub child_count: u32,
    #[serde(default)]
    pub adult_count: u32,
    #[serde(default)]
    pub grouped: bool,
}

/// Counts of `-1` cancel every seat of that class.
#[derive(Debug, Deserialize)]
pub struct CancelRequestBody {
    pub customer: String,
    #[serde(default)]
    pub child_count: i64,
    #[serde(default)]
    pub adult_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct BookingQuery {
    pub customer: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct BookingResponse {
    pub customer: String,
    pub amount_cents: i64,
    pub date: String,
    pub seats: Vec<i32>,
}

impl From<BookingInfo> for BookingResponse {
    fn from(info: BookingInfo) -> Self {
        Self {
            customer: info.customer().to_string(),
            amount_cents: info.amount().cents(),
            date: info.date().to_rfc3339(),
            seats: info.seats().iter().copied().map(i32::from).collect(),
        }
    }
}

// -- Handlers --

/// POST /bookings: book seats; responds with this booking's seats and price.
#[tracing::instrument(skip(state))]
pub async fn book<S: SeatStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(body): Json<BookRequestBody>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    let request = BookingRequest::new(
        body.customer,
        body.child_count,
        body.adult_count,
        body.grouped,
    );
    let info = state.reservations.book(request).await?;

    Ok((StatusCode::CREATED, Json(info.into())))
}

/// POST /bookings/cancel: cancel seats; responds with what the customer
/// still holds and owes.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: SeatStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(body): Json<CancelRequestBody>,
) -> Result<Json<BookingResponse>, ApiError> {
    let request = CancelRequest::from_raw(body.customer, body.child_count, body.adult_count)?;
    let info = state.reservations.cancel(request).await?;

    Ok(Json(info.into()))
}

/// GET /bookings: a customer's booking, or the most recently updated one
/// when no customer is given.
#[tracing::instrument(skip(state))]
pub async fn lookup<S: SeatStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<BookingQuery>,
) -> Result<Json<BookingResponse>, ApiError> {
    let customer = query.customer.map(CustomerId::new);
    let info = state
        .reservations
        .booking_info(customer.as_ref())
        .await?
        .ok_or_else(|| match &customer {
            Some(c) => ApiError::NotFound(format!("No booking for customer {c}")),
            None => ApiError::NotFound("No bookings yet".to_string()),
        })?;

    Ok(Json(info.into()))
}
