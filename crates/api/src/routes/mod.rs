//! HTTP route handlers.

pub mod bookings;
pub mod health;
pub mod metrics;
pub mod prices;
pub mod seats;

use domain::ReservationService;
use seat_store::SeatStore;

/// Shared application state accessible from all handlers.
pub struct AppState<S: SeatStore> {
    pub reservations: ReservationService<S>,
}

impl<S: SeatStore> AppState<S> {
    pub fn new(reservations: ReservationService<S>) -> Self {
        Self { reservations }
    }
}
