//! Seat allocation engine.
//!
//! Pure selection over an in-memory snapshot of free seats. Nothing here
//! touches the store; the caller commits the result inside the same
//! transaction the snapshot was read from.

use common::{PriceClass, SeatNumber};
use thiserror::Error;

/// Errors returned when a request cannot be satisfied from the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// Fewer free seats than requested.
    #[error("Insufficient seats: requested {requested}, available {available}")]
    InsufficientSeats { requested: usize, available: usize },

    /// No run of consecutive free seats is long enough.
    #[error("No block of {requested} consecutive free seats")]
    NoContiguousBlock { requested: usize },
}

/// Seats selected for a request, split by price class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allocation {
    child_seats: Vec<SeatNumber>,
    adult_seats: Vec<SeatNumber>,
}

impl Allocation {
    /// Seats to be tagged child, ascending.
    pub fn child_seats(&self) -> &[SeatNumber] {
        &self.child_seats
    }

    /// Seats to be tagged adult, ascending.
    pub fn adult_seats(&self) -> &[SeatNumber] {
        &self.adult_seats
    }

    /// Every selected seat with its class, ascending by seat number.
    pub fn assignments(&self) -> Vec<(SeatNumber, PriceClass)> {
        let mut assignments: Vec<_> = self
            .child_seats
            .iter()
            .map(|seat| (*seat, PriceClass::Child))
            .chain(self.adult_seats.iter().map(|seat| (*seat, PriceClass::Adult)))
            .collect();
        assignments.sort();
        assignments
    }

    /// Every selected seat, ascending.
    pub fn seats(&self) -> Vec<SeatNumber> {
        self.assignments().into_iter().map(|(seat, _)| seat).collect()
    }

    /// Total number of selected seats.
    pub fn len(&self) -> usize {
        self.child_seats.len() + self.adult_seats.len()
    }

    /// Returns true if nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Selects seats for `child_count` children and `adult_count` adults.
///
/// `free` must be strictly ascending. In ungrouped mode the first
/// `adult_count` free seats go to adults and the next `child_count` to
/// children, regardless of gaps. In grouped mode the first run of
/// consecutive seat numbers long enough for the whole party is used; its
/// leading `child_count` seats go to children and the rest to adults.
///
/// A request for zero seats yields an empty allocation.
pub fn select_seats(
    free: &[SeatNumber],
    child_count: u32,
    adult_count: u32,
    grouped: bool,
) -> Result<Allocation, AllocationError> {
    debug_assert!(
        free.windows(2).all(|pair| pair[0] < pair[1]),
        "free seats must be strictly ascending"
    );

    let children = child_count as usize;
    let adults = adult_count as usize;
    let requested = children + adults;

    if requested == 0 {
        return Ok(Allocation::default());
    }

    if grouped {
        let block = find_block(free, requested)
            .ok_or(AllocationError::NoContiguousBlock { requested })?;
        let (child_seats, adult_seats) = block.split_at(children);
        Ok(Allocation {
            child_seats: child_seats.to_vec(),
            adult_seats: adult_seats.to_vec(),
        })
    } else {
        if free.len() < requested {
            return Err(AllocationError::InsufficientSeats {
                requested,
                available: free.len(),
            });
        }
        let (adult_seats, rest) = free.split_at(adults);
        Ok(Allocation {
            child_seats: rest[..children].to_vec(),
            adult_seats: adult_seats.to_vec(),
        })
    }
}

/// Returns the first window of `len` consecutive seat numbers in `free`.
fn find_block(free: &[SeatNumber], len: usize) -> Option<&[SeatNumber]> {
    let mut run_start = 0;
    for i in 0..free.len() {
        if i > 0 && free[i] != free[i - 1].next() {
            run_start = i;
        }
        if i + 1 - run_start == len {
            return Some(&free[run_start..=i]);
        }
    }
    None
}
