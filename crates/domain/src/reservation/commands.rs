//! Requests accepted by the reservation service.

use common::{CustomerId, PriceClass};
use seat_store::ClearLimit;

use crate::error::BookingError;

/// Request to book seats for a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub customer: CustomerId,
    pub child_count: u32,
    pub adult_count: u32,
    /// Whether the seats must bear consecutive numbers.
    pub grouped: bool,
}

impl BookingRequest {
    /// Creates a booking request.
    pub fn new(
        customer: impl Into<CustomerId>,
        child_count: u32,
        adult_count: u32,
        grouped: bool,
    ) -> Self {
        Self {
            customer: customer.into(),
            child_count,
            adult_count,
            grouped,
        }
    }

    /// Total number of seats requested.
    pub fn total_seats(&self) -> usize {
        self.child_count as usize + self.adult_count as usize
    }
}

/// How many seats of one price class to cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelCount {
    /// Every seat the customer holds in the class.
    All,
    /// At most this many seats.
    Exactly(u32),
}

impl CancelCount {
    /// Number of seats this count stands for, given how many are held.
    pub fn resolve(&self, held: u32) -> u32 {
        match self {
            CancelCount::All => held,
            CancelCount::Exactly(n) => *n,
        }
    }

    /// Returns true if nothing is to be cancelled.
    pub fn is_zero(&self) -> bool {
        matches!(self, CancelCount::Exactly(0))
    }

    pub(crate) fn clear_limit(&self) -> ClearLimit {
        match self {
            CancelCount::All => ClearLimit::All,
            CancelCount::Exactly(n) => ClearLimit::AtMost(*n),
        }
    }
}

impl TryFrom<i64> for CancelCount {
    type Error = BookingError;

    /// `-1` means all seats of the class; other negative values are invalid.
    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(CancelCount::All),
            n if n < -1 => Err(BookingError::InvalidRequest(format!(
                "seat count must be -1 (all) or non-negative, got {n}"
            ))),
            n => u32::try_from(n).map(CancelCount::Exactly).map_err(|_| {
                BookingError::InvalidRequest(format!("seat count {n} is too large"))
            }),
        }
    }
}

impl From<u32> for CancelCount {
    fn from(n: u32) -> Self {
        CancelCount::Exactly(n)
    }
}

/// Request to cancel, in whole or in part, a customer's seats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelRequest {
    pub customer: CustomerId,
    pub child_count: CancelCount,
    pub adult_count: CancelCount,
}

impl CancelRequest {
    /// Creates a cancel request.
    pub fn new(
        customer: impl Into<CustomerId>,
        child_count: impl Into<CancelCount>,
        adult_count: impl Into<CancelCount>,
    ) -> Self {
        Self {
            customer: customer.into(),
            child_count: child_count.into(),
            adult_count: adult_count.into(),
        }
    }

    /// Creates a request cancelling every seat of the customer.
    pub fn all(customer: impl Into<CustomerId>) -> Self {
        Self::new(customer, CancelCount::All, CancelCount::All)
    }

    /// Creates a request from raw counts where `-1` means "all".
    pub fn from_raw(
        customer: impl Into<CustomerId>,
        child_count: i64,
        adult_count: i64,
    ) -> Result<Self, BookingError> {
        Ok(Self::new(
            customer,
            CancelCount::try_from(child_count)?,
            CancelCount::try_from(adult_count)?,
        ))
    }

    /// Returns the count for a price class.
    pub fn count(&self, class: PriceClass) -> CancelCount {
        match class {
            PriceClass::Child => self.child_count,
            PriceClass::Adult => self.adult_count,
        }
    }
}
