//! Integration tests for the reservation service.
//!
//! These tests run the full book / cancel / query cycle against the
//! in-memory seat store, including concurrent customers.

use std::collections::HashSet;
use std::sync::Arc;

use common::{CustomerId, Money, PriceClass, SeatNumber};
use domain::{
    BookingError, BookingRequest, CancelCount, CancelRequest, PriceBook, ReservationService,
};
use seat_store::{InMemorySeatStore, PriceTable, SeatStore, SeatTransaction};

/// Matches the population of the reference test database.
const MAX_SEATS: u32 = 10;
const MAX_CUSTOMERS: usize = 5;

fn create_service(seats: u32) -> ReservationService<InMemorySeatStore> {
    let store = InMemorySeatStore::with_seats(seats, PriceTable::default());
    ReservationService::new(store, Arc::new(PriceBook::default()))
}

fn seats(numbers: &[i32]) -> Vec<SeatNumber> {
    numbers.iter().copied().map(SeatNumber::new).collect()
}

/// Assigns every seat except `free` to `customer` as adult seats, without
/// going through the booking path.
async fn occupy_all_but(
    service: &ReservationService<InMemorySeatStore>,
    customer: &str,
    free: &[i32],
) {
    let customer = CustomerId::new(customer);
    let price = service.prices().await.unit_price(PriceClass::Adult);
    let mut tx = service.store().begin().await.unwrap();
    for seat in tx.free_seats().await.unwrap() {
        if !free.contains(&seat.as_i32()) {
            tx.assign_seat(seat, PriceClass::Adult, price, &customer)
                .await
                .unwrap();
        }
    }
    tx.commit().await.unwrap();
}

mod booking {
    use super::*;

    #[tokio::test]
    async fn initial_state_has_every_seat_free() {
        let service = create_service(MAX_SEATS);

        let free = service.available_seats().await.unwrap();

        assert_eq!(free.len(), MAX_SEATS as usize);
    }

    #[tokio::test]
    async fn simple_booking_takes_every_seat() {
        let service = create_service(MAX_SEATS);

        let info = service
            .book(BookingRequest::new("single user", 0, MAX_SEATS, false))
            .await
            .unwrap();

        assert_eq!(info.seats().len(), MAX_SEATS as usize);
        assert_eq!(info.amount(), Money::from_units(50).times(MAX_SEATS));
        assert!(service.available_seats().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ungrouped_booking_assigns_adults_first() {
        let service = create_service(5);

        let info = service
            .book(BookingRequest::new("alice", 2, 3, false))
            .await
            .unwrap();

        assert_eq!(info.seats(), seats(&[0, 1, 2, 3, 4]).as_slice());
        let held = service
            .store()
            .seats_for_customer(&"alice".into())
            .await
            .unwrap();
        let classes: Vec<_> = held.iter().map(|s| s.class().unwrap()).collect();
        assert_eq!(
            classes,
            vec![
                PriceClass::Adult,
                PriceClass::Adult,
                PriceClass::Adult,
                PriceClass::Child,
                PriceClass::Child,
            ]
        );
    }

    #[tokio::test]
    async fn grouped_booking_uses_first_long_enough_run() {
        let service = create_service(9);
        occupy_all_but(&service, "blocker", &[0, 1, 2, 5, 6, 7, 8]).await;

        let info = service
            .book(BookingRequest::new("family", 2, 2, true))
            .await
            .unwrap();

        assert_eq!(info.seats(), seats(&[5, 6, 7, 8]).as_slice());
        let held = service
            .store()
            .seats_for_customer(&"family".into())
            .await
            .unwrap();
        let assignments: Vec<_> = held
            .iter()
            .map(|s| (s.number.as_i32(), s.class().unwrap()))
            .collect();
        assert_eq!(
            assignments,
            vec![
                (5, PriceClass::Child),
                (6, PriceClass::Child),
                (7, PriceClass::Adult),
                (8, PriceClass::Adult),
            ]
        );
        assert_eq!(
            service.available_seats().await.unwrap(),
            seats(&[0, 1, 2])
        );
    }

    #[tokio::test]
    async fn grouped_booking_without_block_changes_nothing() {
        let service = create_service(6);
        occupy_all_but(&service, "blocker", &[0, 1, 3, 4]).await;

        let err = service
            .book(BookingRequest::new("family", 1, 2, true))
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::NoContiguousBlock { requested: 3 }));
        assert_eq!(
            service.available_seats().await.unwrap(),
            seats(&[0, 1, 3, 4])
        );
        assert!(
            service
                .booking_info(Some(&"family".into()))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn oversized_booking_is_all_or_nothing() {
        let service = create_service(4);

        let err = service
            .book(BookingRequest::new("crowd", 3, 2, false))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BookingError::InsufficientSeats {
                requested: 5,
                available: 4
            }
        ));
        assert_eq!(service.available_seats().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn repeated_bookings_accumulate_in_one_order() {
        let service = create_service(10);

        service
            .book(BookingRequest::new("alice", 1, 0, false))
            .await
            .unwrap();
        let second = service
            .book(BookingRequest::new("alice", 0, 1, false))
            .await
            .unwrap();

        assert_eq!(second.seats(), seats(&[1]).as_slice());
        assert_eq!(second.amount(), Money::from_units(50));

        let info = service
            .booking_info(Some(&"alice".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(info.amount(), Money::from_units(75));
        assert_eq!(info.seats(), seats(&[0, 1]).as_slice());
    }
}

mod cancellation {
    use super::*;

    #[tokio::test]
    async fn matching_cancellation_restores_free_seats() {
        let service = create_service(MAX_SEATS);
        let before = service.available_seats().await.unwrap();

        service
            .book(BookingRequest::new("alice", 2, 3, true))
            .await
            .unwrap();
        let info = service
            .cancel(CancelRequest::new("alice", 2u32, 3u32))
            .await
            .unwrap();

        assert!(info.seats().is_empty());
        assert_eq!(info.amount(), Money::zero());
        assert_eq!(service.available_seats().await.unwrap(), before);
    }

    #[tokio::test]
    async fn simple_cancellation_of_every_adult_seat() {
        let service = create_service(MAX_SEATS);
        service
            .book(BookingRequest::new("single user", 0, MAX_SEATS, false))
            .await
            .unwrap();

        let info = service
            .cancel(CancelRequest::new("single user", 0u32, MAX_SEATS))
            .await
            .unwrap();

        assert!(info.seats().is_empty());
        assert_eq!(
            service.available_seats().await.unwrap().len(),
            MAX_SEATS as usize
        );
    }

    #[tokio::test]
    async fn partial_cancellation_keeps_remaining_seats() {
        let service = create_service(10);
        service
            .book(BookingRequest::new("alice", 2, 2, true))
            .await
            .unwrap();

        let info = service
            .cancel(CancelRequest::new("alice", 1u32, 0u32))
            .await
            .unwrap();

        assert_eq!(info.seats(), seats(&[0, 2, 3]).as_slice());
        assert_eq!(info.amount(), Money::from_units(25 + 50 + 50));
        assert_eq!(
            service.available_seats().await.unwrap(),
            seats(&[1, 4, 5, 6, 7, 8, 9])
        );
    }

    #[tokio::test]
    async fn cancel_all_sentinel_uses_actual_seat_count() {
        let service = create_service(10);
        service
            .book(BookingRequest::new("alice", 3, 1, false))
            .await
            .unwrap();

        let request = CancelRequest::from_raw("alice", -1, 0).unwrap();
        assert_eq!(request.child_count, CancelCount::All);
        let info = service.cancel(request).await.unwrap();

        assert_eq!(info.seats(), seats(&[0]).as_slice());
        assert_eq!(info.amount(), Money::from_units(50));
    }

    #[tokio::test]
    async fn over_refund_leaves_state_unchanged() {
        let service = create_service(10);
        service
            .book(BookingRequest::new("alice", 1, 0, false))
            .await
            .unwrap();
        let free_before = service.available_seats().await.unwrap();
        let info_before = service
            .booking_info(Some(&"alice".into()))
            .await
            .unwrap()
            .unwrap();

        let err = service
            .cancel(CancelRequest::new("alice", 0u32, 1u32))
            .await
            .unwrap_err();

        match err {
            BookingError::OverRefund { refund, amount } => {
                assert_eq!(refund, Money::from_units(50));
                assert_eq!(amount, Money::from_units(25));
            }
            other => panic!("expected OverRefund, got {other:?}"),
        }
        assert_eq!(service.available_seats().await.unwrap(), free_before);
        let info_after = service
            .booking_info(Some(&"alice".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(info_after, info_before);
    }

    #[tokio::test]
    async fn count_beyond_held_seats_only_releases_held() {
        let service = create_service(10);
        service
            .book(BookingRequest::new("alice", 1, 2, false))
            .await
            .unwrap();

        // Refund for two child seats (50) fits the 125 owed, but only one is held.
        let info = service
            .cancel(CancelRequest::new("alice", 2u32, 0u32))
            .await
            .unwrap();

        assert_eq!(info.seats(), seats(&[0, 1]).as_slice());
        assert_eq!(info.amount(), Money::from_units(100));
    }

    #[tokio::test]
    async fn cancellation_rejects_invalid_requests() {
        let service = create_service(3);

        let err = service.cancel(CancelRequest::all("")).await.unwrap_err();
        assert!(matches!(err, BookingError::InvalidRequest(_)));

        assert!(matches!(
            CancelRequest::from_raw("alice", -2, 0),
            Err(BookingError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn fully_cancelled_customer_keeps_zero_order() {
        let service = create_service(4);
        service
            .book(BookingRequest::new("alice", 0, 2, false))
            .await
            .unwrap();
        service.cancel(CancelRequest::all("alice")).await.unwrap();

        let info = service
            .booking_info(Some(&"alice".into()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(info.amount(), Money::zero());
        assert!(info.seats().is_empty());
    }
}

mod queries {
    use super::*;

    #[tokio::test]
    async fn available_seats_on_full_venue_is_empty_not_absent() {
        let service = create_service(3);
        service
            .book(BookingRequest::new("alice", 0, 3, false))
            .await
            .unwrap();

        let free = service.available_seats().await.unwrap();

        assert_eq!(free, Vec::<SeatNumber>::new());
    }

    #[tokio::test]
    async fn booking_info_for_unknown_customer_is_none() {
        let service = create_service(3);

        assert!(
            service
                .booking_info(Some(&"nobody".into()))
                .await
                .unwrap()
                .is_none()
        );
        assert!(service.booking_info(None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn booking_info_without_customer_returns_latest_order() {
        let service = create_service(10);
        service
            .book(BookingRequest::new("alice", 1, 0, false))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        service
            .book(BookingRequest::new("bob", 0, 2, false))
            .await
            .unwrap();

        let latest = service.booking_info(None).await.unwrap().unwrap();

        assert_eq!(latest.customer(), &CustomerId::new("bob"));
        assert_eq!(latest.seats(), seats(&[1, 2]).as_slice());
        assert_eq!(latest.amount(), Money::from_units(100));
    }

    #[tokio::test]
    async fn booking_info_date_tracks_latest_operation() {
        let service = create_service(10);
        let booked = service
            .book(BookingRequest::new("alice", 0, 2, false))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let cancelled = service
            .cancel(CancelRequest::new("alice", 0u32, 1u32))
            .await
            .unwrap();

        let info = service
            .booking_info(Some(&"alice".into()))
            .await
            .unwrap()
            .unwrap();

        assert!(cancelled.date() > booked.date());
        assert_eq!(info.date(), cancelled.date());
    }

    #[tokio::test]
    async fn booking_reply_carries_stored_order_date() {
        let service = create_service(4);
        let booked = service
            .book(BookingRequest::new("alice", 1, 0, false))
            .await
            .unwrap();

        let info = service
            .booking_info(Some(&"alice".into()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(info.date(), booked.date());
    }
}

mod pricing {
    use super::*;

    #[tokio::test]
    async fn refreshed_prices_apply_to_booking_and_cancellation() {
        let store = InMemorySeatStore::with_seats(10, PriceTable::default());
        let service = ReservationService::load(store).await.unwrap();

        service
            .store()
            .set_prices(PriceTable::new(Money::from_units(10), Money::from_units(20)))
            .await;
        let prices = service.refresh_prices().await.unwrap();
        assert_eq!(prices.child, Money::from_units(10));

        let info = service
            .book(BookingRequest::new("alice", 1, 1, false))
            .await
            .unwrap();
        assert_eq!(info.amount(), Money::from_units(30));

        let info = service
            .cancel(CancelRequest::new("alice", 1u32, 0u32))
            .await
            .unwrap();
        assert_eq!(info.amount(), Money::from_units(20));
    }

    async fn book_adult_then_reprice(service: &ReservationService<InMemorySeatStore>, adult: i64) {
        service
            .book(BookingRequest::new("alice", 0, 1, false))
            .await
            .unwrap();
        service
            .price_book()
            .replace(PriceTable::new(Money::from_units(25), Money::from_units(adult)))
            .await;
    }

    #[tokio::test]
    async fn cancellation_after_price_rise_refunds_booked_price() {
        let service = create_service(4);
        book_adult_then_reprice(&service, 70).await;

        let info = service.cancel(CancelRequest::all("alice")).await.unwrap();

        assert_eq!(info.amount(), Money::zero());
        assert!(info.seats().is_empty());
        assert_eq!(service.available_seats().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn cancellation_after_price_drop_leaves_nothing_owed() {
        let service = create_service(4);
        book_adult_then_reprice(&service, 30).await;

        let info = service.cancel(CancelRequest::all("alice")).await.unwrap();

        assert_eq!(info.amount(), Money::zero());
        assert!(info.seats().is_empty());
    }

    #[tokio::test]
    async fn partial_cancellation_refunds_each_seat_at_its_own_price() {
        let service = create_service(4);
        book_adult_then_reprice(&service, 70).await;
        let info = service
            .book(BookingRequest::new("alice", 0, 1, false))
            .await
            .unwrap();
        assert_eq!(info.seats(), seats(&[1]).as_slice());

        // Seat 1 was booked at 70 and is released first.
        let info = service
            .cancel(CancelRequest::new("alice", 0u32, 1u32))
            .await
            .unwrap();
        assert_eq!(info.seats(), seats(&[0]).as_slice());
        assert_eq!(info.amount(), Money::from_units(50));

        let info = service.cancel(CancelRequest::all("alice")).await.unwrap();
        assert_eq!(info.amount(), Money::zero());
    }

    #[tokio::test]
    async fn services_share_one_price_book() {
        let book = Arc::new(PriceBook::default());
        let store = InMemorySeatStore::with_seats(4, PriceTable::default());
        let first = ReservationService::new(store.clone(), book.clone());
        let second = ReservationService::new(store, book.clone());

        book.replace(PriceTable::new(Money::from_units(1), Money::from_units(2)))
            .await;

        assert_eq!(first.prices().await.adult, Money::from_units(2));
        assert_eq!(second.prices().await.adult, Money::from_units(2));
    }
}

mod multi_user {
    use super::*;

    /// Each emulated user repeatedly books a child and an adult seat, then
    /// gives back every adult seat it holds.
    async fn run_user(service: Arc<ReservationService<InMemorySeatStore>>, user: String) {
        for _ in 0..3 {
            match service
                .book(BookingRequest::new(user.as_str(), 1, 1, false))
                .await
            {
                Ok(info) => assert_eq!(info.seats().len(), 2),
                Err(BookingError::NoAvailability | BookingError::InsufficientSeats { .. }) => {}
                Err(e) => panic!("unexpected booking error: {e}"),
            }
            service
                .cancel(CancelRequest::new(user.as_str(), 0u32, CancelCount::All))
                .await
                .unwrap();
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_users_never_share_a_seat() {
        let service = Arc::new(create_service(MAX_SEATS));

        let handles: Vec<_> = (0..MAX_CUSTOMERS)
            .map(|i| tokio::spawn(run_user(service.clone(), format!("user#{i}"))))
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let all = service.store().seats().await.unwrap();
        assert_eq!(all.len(), MAX_SEATS as usize);

        let free: HashSet<_> = service
            .available_seats()
            .await
            .unwrap()
            .into_iter()
            .collect();
        let mut held = HashSet::new();
        for i in 0..MAX_CUSTOMERS {
            let customer = CustomerId::new(format!("user#{i}"));
            let seats = service.store().seats_for_customer(&customer).await.unwrap();
            for seat in &seats {
                assert!(held.insert(seat.number), "seat {} held twice", seat.number);
                assert!(!free.contains(&seat.number));
            }

            if let Some(info) = service.booking_info(Some(&customer)).await.unwrap() {
                let children = seats
                    .iter()
                    .filter(|s| s.class() == Some(PriceClass::Child))
                    .count() as u32;
                let adults = seats.len() as u32 - children;
                assert_eq!(info.amount(), PriceTable::default().total(children, adults));
            }
        }
        assert_eq!(free.len() + held.len(), MAX_SEATS as usize);
    }
}
