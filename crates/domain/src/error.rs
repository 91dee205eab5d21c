//! Domain error types.

use common::Money;
use seat_store::SeatStoreError;
use thiserror::Error;

use crate::allocation::AllocationError;

/// Errors returned by booking, cancellation, and query operations.
///
/// Every variant except `StoreUnavailable` is a normal negative outcome of
/// a business rule. `StoreUnavailable` means the store could not be reached
/// or the transaction failed; it is never retried here.
#[derive(Debug, Error)]
pub enum BookingError {
    /// The venue has no free seat at all.
    #[error("No seats are available")]
    NoAvailability,

    /// Fewer free seats than requested.
    #[error("Insufficient seats: requested {requested}, available {available}")]
    InsufficientSeats { requested: usize, available: usize },

    /// No run of consecutive free seats is long enough for a grouped request.
    #[error("No block of {requested} consecutive free seats")]
    NoContiguousBlock { requested: usize },

    /// Malformed customer or seat counts.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The refund would exceed what the customer currently owes.
    #[error("Refund of {refund} exceeds order amount {amount}")]
    OverRefund { refund: Money, amount: Money },

    /// The seat store failed.
    #[error("Seat store unavailable: {0}")]
    StoreUnavailable(#[from] SeatStoreError),
}

impl BookingError {
    /// Short machine-readable reason, used as a metrics label.
    pub fn reason(&self) -> &'static str {
        match self {
            BookingError::NoAvailability => "no_availability",
            BookingError::InsufficientSeats { .. } => "insufficient_seats",
            BookingError::NoContiguousBlock { .. } => "no_contiguous_block",
            BookingError::InvalidRequest(_) => "invalid_request",
            BookingError::OverRefund { .. } => "over_refund",
            BookingError::StoreUnavailable(_) => "store_unavailable",
        }
    }

    /// Returns true for business-rule rejections, false for store failures.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, BookingError::StoreUnavailable(_))
    }
}

impl From<AllocationError> for BookingError {
    fn from(e: AllocationError) -> Self {
        match e {
            AllocationError::InsufficientSeats {
                requested,
                available,
            } => BookingError::InsufficientSeats {
                requested,
                available,
            },
            AllocationError::NoContiguousBlock { requested } => {
                BookingError::NoContiguousBlock { requested }
            }
        }
    }
}
