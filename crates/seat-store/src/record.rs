//! Records persisted by the seat store.

use chrono::{DateTime, Utc};
use common::{CustomerId, Money, PriceClass, SeatNumber};
use serde::{Deserialize, Serialize};

/// Owner, price class and booked unit price of an assigned seat.
///
/// Kept together so a seat can never carry a customer without a class
/// or a class without a customer. `price` is the unit price in effect when
/// the seat was booked; refunds use it even after prices change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatAssignment {
    pub class: PriceClass,
    pub customer: CustomerId,
    pub price: Money,
}

/// A seat of the venue and its current assignment, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub number: SeatNumber,
    pub assignment: Option<SeatAssignment>,
}

impl Seat {
    /// Creates a free seat.
    pub fn free(number: SeatNumber) -> Self {
        Self {
            number,
            assignment: None,
        }
    }

    /// Creates a seat assigned to a customer in a price class at `price`.
    pub fn assigned(
        number: SeatNumber,
        class: PriceClass,
        customer: CustomerId,
        price: Money,
    ) -> Self {
        Self {
            number,
            assignment: Some(SeatAssignment {
                class,
                customer,
                price,
            }),
        }
    }

    /// Returns true if no customer holds the seat.
    pub fn is_free(&self) -> bool {
        self.assignment.is_none()
    }

    /// Returns the price class of the seat, if assigned.
    pub fn class(&self) -> Option<PriceClass> {
        self.assignment.as_ref().map(|a| a.class)
    }

    /// Returns the customer holding the seat, if assigned.
    pub fn customer(&self) -> Option<&CustomerId> {
        self.assignment.as_ref().map(|a| &a.customer)
    }

    /// Returns the unit price the seat was booked at, if assigned.
    pub fn price(&self) -> Option<Money> {
        self.assignment.as_ref().map(|a| a.price)
    }
}

/// Aggregate order of a customer: the running amount owed and the time
/// of the most recent booking or cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub customer: CustomerId,
    pub amount: Money,
    pub updated_at: DateTime<Utc>,
}

/// An order together with the seats its customer holds, read atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSnapshot {
    pub order: OrderRecord,
    pub seats: Vec<Seat>,
}

/// Unit price of each price class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTable {
    pub child: Money,
    pub adult: Money,
}

impl PriceTable {
    /// Creates a price table.
    pub fn new(child: Money, adult: Money) -> Self {
        Self { child, adult }
    }

    /// Returns the unit price of a price class.
    pub fn unit_price(&self, class: PriceClass) -> Money {
        match class {
            PriceClass::Child => self.child,
            PriceClass::Adult => self.adult,
        }
    }

    /// Returns the price of `child` child seats and `adult` adult seats.
    pub fn total(&self, child: u32, adult: u32) -> Money {
        self.child.times(child) + self.adult.times(adult)
    }
}

impl Default for PriceTable {
    /// Seed prices: 25.00 per child seat and 50.00 per adult seat.
    fn default() -> Self {
        Self {
            child: Money::from_units(25),
            adult: Money::from_units(50),
        }
    }
}

/// How many of a customer's seats in one class to release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearLimit {
    /// Release every seat the customer holds in the class.
    All,
    /// Release at most this many seats.
    AtMost(u32),
}

impl ClearLimit {
    /// Returns the limit as an optional row count (`None` = unlimited).
    pub fn as_row_limit(&self) -> Option<i64> {
        match self {
            ClearLimit::All => None,
            ClearLimit::AtMost(n) => Some(i64::from(*n)),
        }
    }
}
