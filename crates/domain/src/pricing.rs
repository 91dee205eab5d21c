//! Shared, replaceable price configuration.

use std::sync::Arc;

use seat_store::{PriceTable, SeatStore, SeatStoreError};
use tokio::sync::RwLock;

/// Holds the price table used by every booking and cancellation.
///
/// The table itself is immutable. Refreshing swaps in a whole new table;
/// operations already holding the previous one finish with it.
#[derive(Debug)]
pub struct PriceBook {
    current: RwLock<Arc<PriceTable>>,
}

impl PriceBook {
    /// Creates a price book starting with `table`.
    pub fn new(table: PriceTable) -> Self {
        Self {
            current: RwLock::new(Arc::new(table)),
        }
    }

    /// Creates a price book from the prices stored in `store`.
    pub async fn load<S: SeatStore>(store: &S) -> Result<Self, SeatStoreError> {
        Ok(Self::new(store.prices().await?))
    }

    /// Returns the current price table.
    pub async fn current(&self) -> Arc<PriceTable> {
        self.current.read().await.clone()
    }

    /// Replaces the price table, returning the previous one.
    pub async fn replace(&self, table: PriceTable) -> Arc<PriceTable> {
        let mut current = self.current.write().await;
        std::mem::replace(&mut *current, Arc::new(table))
    }

    /// Reloads the prices from `store` and installs them.
    ///
    /// On failure the current table is kept.
    #[tracing::instrument(skip_all)]
    pub async fn refresh<S: SeatStore>(&self, store: &S) -> Result<Arc<PriceTable>, SeatStoreError> {
        let table = store.prices().await?;
        self.replace(table).await;
        tracing::info!(
            child_cents = table.child.cents(),
            adult_cents = table.adult.cents(),
            "price table refreshed"
        );
        Ok(self.current().await)
    }
}

impl Default for PriceBook {
    fn default() -> Self {
        Self::new(PriceTable::default())
    }
}
