use common::{SeatNumber, UnknownPriceClass};
use thiserror::Error;

/// Errors that can occur when interacting with the seat store.
#[derive(Debug, Error)]
pub enum SeatStoreError {
    /// The seat was already assigned when the transaction tried to take it.
    #[error("Seat {seat} is already assigned")]
    SeatConflict { seat: SeatNumber },

    /// The seat number is outside the provisioned inventory.
    #[error("Unknown seat: {0}")]
    UnknownSeat(SeatNumber),

    /// The requested seat count does not fit the seat number range.
    #[error("Seat count {0} exceeds the largest seat number")]
    SeatCountOutOfRange(u32),

    /// The price table has not been provisioned.
    #[error("Price table is not provisioned")]
    MissingPrices,

    /// A stored row could not be mapped to a record.
    #[error("Invalid row: {0}")]
    InvalidRow(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<UnknownPriceClass> for SeatStoreError {
    fn from(e: UnknownPriceClass) -> Self {
        SeatStoreError::InvalidRow(e.to_string())
    }
}

/// Result type for seat store operations.
pub type Result<T> = std::result::Result<T, SeatStoreError>;
