//! Price table endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use seat_store::{PriceTable, SeatStore};
use serde::Serialize;

use super::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct PricesResponse {
    pub child_cents: i64,
    pub adult_cents: i64,
}

impl From<&PriceTable> for PricesResponse {
    fn from(table: &PriceTable) -> Self {
        Self {
            child_cents: table.child.cents(),
            adult_cents: table.adult.cents(),
        }
    }
}

/// GET /prices: unit prices currently applied to bookings and refunds.
pub async fn get<S: SeatStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<PricesResponse> {
    let prices = state.reservations.prices().await;
    Json(PricesResponse::from(prices.as_ref()))
}

/// POST /prices/refresh: reload unit prices from the store.
#[tracing::instrument(skip(state))]
pub async fn refresh<S: SeatStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<PricesResponse>, ApiError> {
    let prices = state.reservations.refresh_prices().await?;
    Ok(Json(PricesResponse::from(prices.as_ref())))
}
