use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    ClearLimit, CustomerId, Money, OrderRecord, OrderSnapshot, PriceClass, PriceTable, Result,
    Seat, SeatNumber,
};

/// Core trait for seat store implementations.
///
/// Reads issued directly on the store observe only committed state. All
/// mutations go through a [`SeatTransaction`] obtained from [`SeatStore::begin`];
/// implementations serialize transactions so that a read-allocate-write
/// sequence performed inside one cannot race with another writer.
#[async_trait]
pub trait SeatStore: Send + Sync {
    /// Transaction type handed out by [`SeatStore::begin`].
    type Transaction: SeatTransaction;

    /// Starts a transaction. Waits until no other transaction is active.
    async fn begin(&self) -> Result<Self::Transaction>;

    /// Returns the numbers of all free seats, ascending.
    ///
    /// An inventory with no free seat yields an empty vector.
    async fn free_seats(&self) -> Result<Vec<SeatNumber>>;

    /// Returns every seat of the venue, ascending by number.
    async fn seats(&self) -> Result<Vec<Seat>>;

    /// Returns the seats assigned to a customer, ascending by number.
    async fn seats_for_customer(&self, customer: &CustomerId) -> Result<Vec<Seat>>;

    /// Returns the order of a customer, or the most recently updated order
    /// across all customers when `customer` is `None`.
    async fn latest_order(&self, customer: Option<&CustomerId>) -> Result<Option<OrderRecord>>;

    /// Like [`SeatStore::latest_order`], but also returns the seats held by
    /// the order's customer, both read from the same committed state.
    async fn order_snapshot(&self, customer: Option<&CustomerId>) -> Result<Option<OrderSnapshot>>;

    /// Loads the unit prices.
    ///
    /// Fails with `MissingPrices` if the store was never provisioned.
    async fn prices(&self) -> Result<PriceTable>;
}

/// A unit of work against the seat store.
///
/// Reads inside the transaction see its own uncommitted writes. Nothing is
/// visible to other readers until [`SeatTransaction::commit`]; dropping the
/// transaction without committing discards every change.
#[async_trait]
pub trait SeatTransaction: Send {
    /// Returns the numbers of all free seats, ascending.
    async fn free_seats(&mut self) -> Result<Vec<SeatNumber>>;

    /// Returns the seats assigned to a customer, ascending by number.
    async fn seats_for_customer(&mut self, customer: &CustomerId) -> Result<Vec<Seat>>;

    /// Returns the order of a customer, if one exists.
    async fn order(&mut self, customer: &CustomerId) -> Result<Option<OrderRecord>>;

    /// Assigns a free seat to a customer in a price class, recording the
    /// unit price it is booked at.
    ///
    /// Fails with `SeatConflict` if the seat is already held and with
    /// `UnknownSeat` if it was never provisioned.
    async fn assign_seat(
        &mut self,
        seat: SeatNumber,
        class: PriceClass,
        price: Money,
        customer: &CustomerId,
    ) -> Result<()>;

    /// Releases a customer's seats in one class, highest number first.
    ///
    /// Returns the released seats as they were held (with their booked
    /// prices), ascending by number.
    async fn clear_seats(
        &mut self,
        customer: &CustomerId,
        class: PriceClass,
        limit: ClearLimit,
    ) -> Result<Vec<Seat>>;

    /// Adds `delta` to a customer's order amount and stamps it with `at`,
    /// creating the order if needed. Returns the updated order.
    async fn upsert_order(
        &mut self,
        customer: &CustomerId,
        delta: Money,
        at: DateTime<Utc>,
    ) -> Result<OrderRecord>;

    /// Publishes every change made in the transaction atomically.
    async fn commit(self) -> Result<()>;

    /// Discards every change made in the transaction.
    async fn rollback(self) -> Result<()>;
}
