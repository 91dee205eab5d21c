//! Value types shared by the seat store, the domain, and the API.

pub mod types;

pub use types::{CustomerId, Money, PriceClass, SeatNumber, UnknownPriceClass};
