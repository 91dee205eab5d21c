use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of a seat in the venue.
///
/// Seats are numbered densely from `0` to `N - 1` and are never created
/// or destroyed at runtime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SeatNumber(i32);

impl SeatNumber {
    /// Creates a seat number from its raw value.
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    /// Returns the raw seat number.
    pub fn as_i32(&self) -> i32 {
        self.0
    }

    /// Returns the seat immediately after this one.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for SeatNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for SeatNumber {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl From<SeatNumber> for i32 {
    fn from(seat: SeatNumber) -> Self {
        seat.0
    }
}

/// Identifier of the customer holding seats.
///
/// Any string is accepted at construction; services reject blank
/// identifiers before touching the store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    /// Creates a customer ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the customer ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the identifier is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CustomerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CustomerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for CustomerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Price tier of a booked seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceClass {
    Child,
    Adult,
}

impl PriceClass {
    /// All price classes, in storage-code order.
    pub const ALL: [PriceClass; 2] = [PriceClass::Child, PriceClass::Adult];

    /// Returns the integer code used to persist this class.
    pub fn code(&self) -> i16 {
        match self {
            PriceClass::Child => 1,
            PriceClass::Adult => 2,
        }
    }

    /// Parses a persisted class code.
    pub fn from_code(code: i16) -> Result<Self, UnknownPriceClass> {
        match code {
            1 => Ok(PriceClass::Child),
            2 => Ok(PriceClass::Adult),
            other => Err(UnknownPriceClass(other)),
        }
    }
}

impl std::fmt::Display for PriceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceClass::Child => write!(f, "child"),
            PriceClass::Adult => write!(f, "adult"),
        }
    }
}

/// A persisted price class code that does not map to a known class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Unknown price class code: {0}")]
pub struct UnknownPriceClass(pub i16);

/// Money amount represented in cents to avoid floating point issues.
///
/// Negative amounts are representable so that order adjustments can be
/// expressed as signed deltas.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Money {
    /// Amount in cents (e.g., 2500 = 25.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Creates a new Money amount from whole currency units.
    pub fn from_units(units: i64) -> Self {
        Self { cents: units * 100 }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Multiplies a unit price by a seat count.
    pub fn times(&self, count: u32) -> Self {
        Self {
            cents: self.cents * i64::from(count),
        }
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.cents < 0 { "-" } else { "" };
        let abs = self.cents.abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            cents: self.cents + other.cents,
        }
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        self.cents += other.cents;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            cents: self.cents - other.cents,
        }
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Self) {
        self.cents -= other.cents;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self { cents: -self.cents }
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}
