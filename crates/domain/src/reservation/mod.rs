//! Booking, cancellation, and availability queries over a seat store.

mod commands;
mod info;
mod service;

pub use commands::{BookingRequest, CancelCount, CancelRequest};
pub use info::BookingInfo;
pub use service::ReservationService;
