//! Domain layer for the seat reservation system.
//!
//! This crate provides:
//! - The allocation engine choosing which free seats satisfy a request
//! - The price book shared by booking and cancellation
//! - The reservation service orchestrating bookings, cancellations, and
//!   availability queries inside store transactions

pub mod allocation;
pub mod error;
pub mod pricing;
pub mod reservation;

pub use allocation::{Allocation, AllocationError, select_seats};
pub use error::BookingError;
pub use pricing::PriceBook;
pub use reservation::{BookingInfo, BookingRequest, CancelCount, CancelRequest, ReservationService};
