//! Seat availability endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use seat_store::SeatStore;
use serde::Serialize;

use super::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct AvailableSeatsResponse {
    pub seats: Vec<i32>,
}

/// GET /seats/available: free seat numbers, ascending. Empty when sold out.
#[tracing::instrument(skip(state))]
pub async fn available<S: SeatStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<AvailableSeatsResponse>, ApiError> {
    let seats = state.reservations.available_seats().await?;

    Ok(Json(AvailableSeatsResponse {
        seats: seats.into_iter().map(i32::from).collect(),
    }))
}
