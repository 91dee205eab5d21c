use chrono::{DateTime, Utc};
use common::{CustomerId, Money, SeatNumber};
use serde::{Deserialize, Serialize};

/// Snapshot of a customer's booking returned to callers.
///
/// After a booking it carries that booking's price and newly assigned
/// seats; after a cancellation or a lookup, the order's running amount and
/// every seat the customer still holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingInfo {
    customer: CustomerId,
    amount: Money,
    date: DateTime<Utc>,
    seats: Vec<SeatNumber>,
}

impl BookingInfo {
    /// Creates a booking info. Seats are stored in ascending order.
    pub fn new(
        customer: CustomerId,
        amount: Money,
        date: DateTime<Utc>,
        mut seats: Vec<SeatNumber>,
    ) -> Self {
        seats.sort();
        Self {
            customer,
            amount,
            date,
            seats,
        }
    }

    pub fn customer(&self) -> &CustomerId {
        &self.customer
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn seats(&self) -> &[SeatNumber] {
        &self.seats
    }
}

impl std::fmt::Display for BookingInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let seats: Vec<String> = self.seats.iter().map(|s| s.to_string()).collect();
        write!(
            f,
            "BookingInfo {{ customer: {}, amount: {}, date: {}, seats: [{}] }}",
            self.customer,
            self.amount,
            self.date.to_rfc3339(),
            seats.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seats_are_sorted_on_construction() {
        let info = BookingInfo::new(
            "alice".into(),
            Money::from_units(75),
            Utc::now(),
            vec![SeatNumber::new(4), SeatNumber::new(1)],
        );

        assert_eq!(info.seats(), &[SeatNumber::new(1), SeatNumber::new(4)]);
        assert_eq!(info.customer().as_str(), "alice");
        assert_eq!(info.amount(), Money::from_units(75));
    }

    #[test]
    fn serializes_with_amount_in_cents() {
        let info = BookingInfo::new(
            "carol".into(),
            Money::from_units(25),
            Utc::now(),
            vec![SeatNumber::new(7)],
        );

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["customer"], "carol");
        assert_eq!(json["amount"]["cents"], 2500);
        assert_eq!(json["seats"], serde_json::json!([7]));
    }

    #[test]
    fn display_lists_seats() {
        let info = BookingInfo::new(
            "bob".into(),
            Money::from_units(50),
            Utc::now(),
            vec![SeatNumber::new(2)],
        );

        let text = info.to_string();
        assert!(text.contains("customer: bob"));
        assert!(text.contains("amount: 50.00"));
        assert!(text.contains("seats: [2]"));
    }
}
