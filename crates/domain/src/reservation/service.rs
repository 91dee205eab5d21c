//! Reservation service orchestrating allocation and order bookkeeping.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use common::{CustomerId, Money, PriceClass, SeatNumber};
use seat_store::{PriceTable, Seat, SeatStore, SeatTransaction};

use crate::allocation::select_seats;
use crate::error::BookingError;
use crate::pricing::PriceBook;

use super::{BookingInfo, BookingRequest, CancelRequest};

/// Service for booking and cancelling seats.
///
/// Each booking or cancellation runs as one store transaction: the free-seat
/// snapshot, the per-seat writes, and the order update either all commit or
/// none do. Order amounts are maintained here as signed deltas so that an
/// order always equals the price of the seats its customer holds.
pub struct ReservationService<S: SeatStore> {
    store: S,
    prices: Arc<PriceBook>,
}

impl<S: SeatStore> ReservationService<S> {
    /// Creates a new reservation service.
    pub fn new(store: S, prices: Arc<PriceBook>) -> Self {
        Self { store, prices }
    }

    /// Creates a service whose price book is loaded from the store.
    pub async fn load(store: S) -> Result<Self, BookingError> {
        let prices = PriceBook::load(&store).await?;
        Ok(Self::new(store, Arc::new(prices)))
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the shared price book.
    pub fn price_book(&self) -> &Arc<PriceBook> {
        &self.prices
    }

    /// Books seats for a customer, all or nothing.
    ///
    /// Returns this booking's amount and newly assigned seats.
    #[tracing::instrument(skip(self))]
    pub async fn book(&self, request: BookingRequest) -> Result<BookingInfo, BookingError> {
        let started = Instant::now();
        let result = self.try_book(&request).await;
        metrics::histogram!("booking_duration_seconds").record(started.elapsed().as_secs_f64());

        match &result {
            Ok(info) => {
                metrics::counter!("bookings_total").increment(1);
                metrics::counter!("seats_booked_total").increment(info.seats().len() as u64);
                tracing::info!(
                    customer = %info.customer(),
                    seats = ?info.seats(),
                    amount = %info.amount(),
                    "booking committed"
                );
            }
            Err(e) => record_failure("bookings_rejected_total", e),
        }
        result
    }

    async fn try_book(&self, request: &BookingRequest) -> Result<BookingInfo, BookingError> {
        ensure_customer(&request.customer)?;
        let prices = self.prices.current().await;

        let mut tx = self.store.begin().await?;
        let free = tx.free_seats().await?;
        if free.is_empty() {
            return Err(BookingError::NoAvailability);
        }

        let allocation = select_seats(
            &free,
            request.child_count,
            request.adult_count,
            request.grouped,
        )?;
        let now = Utc::now();
        if allocation.is_empty() {
            return Ok(BookingInfo::new(
                request.customer.clone(),
                Money::zero(),
                now,
                Vec::new(),
            ));
        }

        for (seat, class) in allocation.assignments() {
            tx.assign_seat(seat, class, prices.unit_price(class), &request.customer)
                .await?;
        }

        let amount = prices.total(request.child_count, request.adult_count);
        let order = tx.upsert_order(&request.customer, amount, now).await?;
        tx.commit().await?;

        Ok(BookingInfo::new(
            request.customer.clone(),
            amount,
            order.updated_at,
            allocation.seats(),
        ))
    }

    /// Cancels some or all of a customer's seats.
    ///
    /// Returns the order's remaining amount and the seats still held.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, request: CancelRequest) -> Result<BookingInfo, BookingError> {
        let result = self.try_cancel(&request).await;

        match &result {
            Ok(info) => {
                metrics::counter!("cancellations_total").increment(1);
                tracing::info!(
                    customer = %info.customer(),
                    remaining = ?info.seats(),
                    amount = %info.amount(),
                    "cancellation committed"
                );
            }
            Err(e) => record_failure("cancellations_rejected_total", e),
        }
        result
    }

    async fn try_cancel(&self, request: &CancelRequest) -> Result<BookingInfo, BookingError> {
        ensure_customer(&request.customer)?;
        let customer = &request.customer;
        let prices = self.prices.current().await;

        let mut tx = self.store.begin().await?;
        let held = tx.seats_for_customer(customer).await?;
        let refund = requested_refund(&prices, request, &held);

        let order = tx.order(customer).await?;
        let amount = order.as_ref().map(|o| o.amount).unwrap_or_default();
        if refund > amount {
            return Err(BookingError::OverRefund { refund, amount });
        }

        let mut released_value = Money::zero();
        let mut released_count = 0usize;
        for class in PriceClass::ALL {
            let count = request.count(class);
            if count.is_zero() {
                continue;
            }
            let released = tx
                .clear_seats(customer, class, count.clear_limit())
                .await?;
            released_value += released.iter().filter_map(Seat::price).sum::<Money>();
            released_count += released.len();
        }

        let (remaining_amount, date) = match order {
            Some(_) => {
                let order = tx
                    .upsert_order(customer, -released_value, Utc::now())
                    .await?;
                (order.amount, order.updated_at)
            }
            None => (amount, Utc::now()),
        };
        let remaining: Vec<SeatNumber> = tx
            .seats_for_customer(customer)
            .await?
            .into_iter()
            .map(|seat| seat.number)
            .collect();
        tx.commit().await?;

        metrics::counter!("seats_released_total").increment(released_count as u64);
        Ok(BookingInfo::new(
            customer.clone(),
            remaining_amount,
            date,
            remaining,
        ))
    }

    /// Returns the numbers of all free seats, ascending.
    ///
    /// A fully booked venue yields an empty vector.
    #[tracing::instrument(skip(self))]
    pub async fn available_seats(&self) -> Result<Vec<SeatNumber>, BookingError> {
        Ok(self.store.free_seats().await?)
    }

    /// Returns the latest order of `customer`, or the most recent order of
    /// any customer when `customer` is `None`.
    ///
    /// The result carries the order's running amount and last update time
    /// together with every seat its customer currently holds.
    #[tracing::instrument(skip(self))]
    pub async fn booking_info(
        &self,
        customer: Option<&CustomerId>,
    ) -> Result<Option<BookingInfo>, BookingError> {
        let snapshot = self.store.order_snapshot(customer).await?;

        Ok(snapshot.map(|snapshot| {
            BookingInfo::new(
                snapshot.order.customer,
                snapshot.order.amount,
                snapshot.order.updated_at,
                snapshot.seats.into_iter().map(|seat| seat.number).collect(),
            )
        }))
    }

    /// Returns the price table currently in effect.
    pub async fn prices(&self) -> Arc<PriceTable> {
        self.prices.current().await
    }

    /// Reloads the price table from the store.
    pub async fn refresh_prices(&self) -> Result<Arc<PriceTable>, BookingError> {
        Ok(self.prices.refresh(&self.store).await?)
    }
}

fn ensure_customer(customer: &CustomerId) -> Result<(), BookingError> {
    if customer.is_blank() {
        return Err(BookingError::InvalidRequest(
            "customer must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Refund implied by the request.
///
/// Held seats are valued at the price they were booked at, highest number
/// first, matching the order in which they are released. Seats asked for
/// beyond those held are valued at the current unit price; "all" resolves
/// to the seats held.
fn requested_refund(prices: &PriceTable, request: &CancelRequest, held: &[Seat]) -> Money {
    PriceClass::ALL
        .iter()
        .map(|&class| {
            let booked: Vec<Money> = held
                .iter()
                .rev()
                .filter(|seat| seat.class() == Some(class))
                .filter_map(Seat::price)
                .collect();
            let wanted = request.count(class).resolve(booked.len() as u32) as usize;
            let beyond_held = wanted.saturating_sub(booked.len()) as u32;

            booked.iter().take(wanted).copied().sum::<Money>()
                + prices.unit_price(class).times(beyond_held)
        })
        .sum()
}

fn record_failure(counter: &'static str, error: &BookingError) {
    metrics::counter!(counter, "reason" => error.reason()).increment(1);
    if error.is_rejection() {
        tracing::info!(reason = error.reason(), error = %error, "request rejected");
    } else {
        tracing::error!(error = %error, "seat store failure");
    }
}
