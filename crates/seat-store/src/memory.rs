use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::{
    ClearLimit, CustomerId, Money, OrderRecord, OrderSnapshot, PriceClass, PriceTable, Result,
    Seat, SeatAssignment, SeatNumber, SeatStoreError,
    store::{SeatStore, SeatTransaction},
};

#[derive(Debug, Clone, Default)]
struct Inventory {
    seats: BTreeMap<SeatNumber, Option<SeatAssignment>>,
    orders: HashMap<CustomerId, OrderRecord>,
    prices: Option<PriceTable>,
}

impl Inventory {
    fn free_seats(&self) -> Vec<SeatNumber> {
        self.seats
            .iter()
            .filter(|(_, assignment)| assignment.is_none())
            .map(|(number, _)| *number)
            .collect()
    }

    fn seats(&self) -> Vec<Seat> {
        self.seats
            .iter()
            .map(|(number, assignment)| Seat {
                number: *number,
                assignment: assignment.clone(),
            })
            .collect()
    }

    fn seats_for_customer(&self, customer: &CustomerId) -> Vec<Seat> {
        self.seats()
            .into_iter()
            .filter(|seat| seat.customer() == Some(customer))
            .collect()
    }

    fn latest_order(&self, customer: Option<&CustomerId>) -> Option<OrderRecord> {
        match customer {
            Some(customer) => self.orders.get(customer).cloned(),
            None => self
                .orders
                .values()
                .max_by(|a, b| {
                    a.updated_at
                        .cmp(&b.updated_at)
                        .then_with(|| a.customer.cmp(&b.customer))
                })
                .cloned(),
        }
    }

    fn assign(
        &mut self,
        seat: SeatNumber,
        class: PriceClass,
        price: Money,
        customer: &CustomerId,
    ) -> Result<()> {
        let slot = self
            .seats
            .get_mut(&seat)
            .ok_or(SeatStoreError::UnknownSeat(seat))?;

        if slot.is_some() {
            return Err(SeatStoreError::SeatConflict { seat });
        }

        *slot = Some(SeatAssignment {
            class,
            customer: customer.clone(),
            price,
        });
        Ok(())
    }

    fn clear(
        &mut self,
        customer: &CustomerId,
        class: PriceClass,
        limit: ClearLimit,
    ) -> Vec<Seat> {
        let mut released = Vec::new();
        for (number, slot) in self.seats.iter_mut().rev() {
            if let ClearLimit::AtMost(n) = limit
                && released.len() >= n as usize
            {
                break;
            }
            if matches!(slot, Some(a) if a.class == class && &a.customer == customer) {
                released.push(Seat {
                    number: *number,
                    assignment: slot.take(),
                });
            }
        }

        released.reverse();
        released
    }

    fn upsert_order(
        &mut self,
        customer: &CustomerId,
        delta: Money,
        at: DateTime<Utc>,
    ) -> OrderRecord {
        let order = self
            .orders
            .entry(customer.clone())
            .or_insert_with(|| OrderRecord {
                customer: customer.clone(),
                amount: Money::zero(),
                updated_at: at,
            });
        order.amount += delta;
        order.updated_at = at;
        order.clone()
    }

    fn provision(&mut self, seat_count: u32, prices: PriceTable) {
        for n in 0..seat_count {
            let number = SeatNumber::new(n as i32);
            self.seats.entry(number).or_insert(None);
        }
        self.prices.get_or_insert(prices);
    }
}

/// In-memory seat store implementation.
///
/// A transaction holds the exclusive lock over the whole inventory for its
/// lifetime and stages its writes on a private copy, so writers are
/// serialized and readers only ever observe committed state.
#[derive(Clone, Default)]
pub struct InMemorySeatStore {
    inventory: Arc<RwLock<Inventory>>,
}

impl InMemorySeatStore {
    /// Creates a new store with no seats and no prices.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store provisioned with seats `0..seat_count` and `prices`.
    pub fn with_seats(seat_count: u32, prices: PriceTable) -> Self {
        let mut inventory = Inventory::default();
        inventory.provision(seat_count, prices);
        Self {
            inventory: Arc::new(RwLock::new(inventory)),
        }
    }

    /// Adds any missing seats in `0..seat_count` as free seats and seeds the
    /// price table if it is empty. Existing assignments are left untouched.
    pub async fn provision(&self, seat_count: u32, prices: PriceTable) {
        self.inventory.write().await.provision(seat_count, prices);
    }

    /// Replaces the stored unit prices.
    pub async fn set_prices(&self, prices: PriceTable) {
        self.inventory.write().await.prices = Some(prices);
    }

    /// Returns the number of provisioned seats.
    pub async fn seat_count(&self) -> usize {
        self.inventory.read().await.seats.len()
    }

    /// Returns the number of order rows.
    pub async fn order_count(&self) -> usize {
        self.inventory.read().await.orders.len()
    }
}

#[async_trait]
impl SeatStore for InMemorySeatStore {
    type Transaction = InMemoryTransaction;

    async fn begin(&self) -> Result<InMemoryTransaction> {
        let guard = self.inventory.clone().write_owned().await;
        let staged = guard.clone();
        Ok(InMemoryTransaction { guard, staged })
    }

    async fn free_seats(&self) -> Result<Vec<SeatNumber>> {
        Ok(self.inventory.read().await.free_seats())
    }

    async fn seats(&self) -> Result<Vec<Seat>> {
        Ok(self.inventory.read().await.seats())
    }

    async fn seats_for_customer(&self, customer: &CustomerId) -> Result<Vec<Seat>> {
        Ok(self.inventory.read().await.seats_for_customer(customer))
    }

    async fn latest_order(&self, customer: Option<&CustomerId>) -> Result<Option<OrderRecord>> {
        Ok(self.inventory.read().await.latest_order(customer))
    }

    async fn order_snapshot(&self, customer: Option<&CustomerId>) -> Result<Option<OrderSnapshot>> {
        let inventory = self.inventory.read().await;
        Ok(inventory.latest_order(customer).map(|order| OrderSnapshot {
            seats: inventory.seats_for_customer(&order.customer),
            order,
        }))
    }

    async fn prices(&self) -> Result<PriceTable> {
        self.inventory
            .read()
            .await
            .prices
            .ok_or(SeatStoreError::MissingPrices)
    }
}

/// Transaction over an [`InMemorySeatStore`].
pub struct InMemoryTransaction {
    guard: OwnedRwLockWriteGuard<Inventory>,
    staged: Inventory,
}

#[async_trait]
impl SeatTransaction for InMemoryTransaction {
    async fn free_seats(&mut self) -> Result<Vec<SeatNumber>> {
        Ok(self.staged.free_seats())
    }

    async fn seats_for_customer(&mut self, customer: &CustomerId) -> Result<Vec<Seat>> {
        Ok(self.staged.seats_for_customer(customer))
    }

    async fn order(&mut self, customer: &CustomerId) -> Result<Option<OrderRecord>> {
        Ok(self.staged.orders.get(customer).cloned())
    }

    async fn assign_seat(
        &mut self,
        seat: SeatNumber,
        class: PriceClass,
        price: Money,
        customer: &CustomerId,
    ) -> Result<()> {
        self.staged.assign(seat, class, price, customer)
    }

    async fn clear_seats(
        &mut self,
        customer: &CustomerId,
        class: PriceClass,
        limit: ClearLimit,
    ) -> Result<Vec<Seat>> {
        Ok(self.staged.clear(customer, class, limit))
    }

    async fn upsert_order(
        &mut self,
        customer: &CustomerId,
        delta: Money,
        at: DateTime<Utc>,
    ) -> Result<OrderRecord> {
        Ok(self.staged.upsert_order(customer, delta, at))
    }

    async fn commit(self) -> Result<()> {
        let Self { mut guard, staged } = self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}
