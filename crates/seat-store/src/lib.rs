//! Persistent seat inventory for a single venue.
//!
//! The store keeps three relations: seats (with their optional price class
//! and owner), per-customer order totals, and the unit price of each price
//! class. It is a passive record keeper: order totals are computed by the
//! caller and written as signed deltas inside a [`SeatTransaction`].

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use common::{CustomerId, Money, PriceClass, SeatNumber};
pub use error::{Result, SeatStoreError};
pub use memory::{InMemorySeatStore, InMemoryTransaction};
pub use postgres::{PostgresSeatStore, PostgresTransaction};
pub use record::{ClearLimit, OrderRecord, OrderSnapshot, PriceTable, Seat, SeatAssignment};
pub use store::{SeatStore, SeatTransaction};
