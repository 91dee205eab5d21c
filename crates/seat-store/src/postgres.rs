use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool, Postgres, Row, postgres::PgPoolOptions, postgres::PgRow};

use crate::{
    ClearLimit, CustomerId, Money, OrderRecord, OrderSnapshot, PriceClass, PriceTable, Result,
    Seat, SeatNumber, SeatStoreError,
    store::{SeatStore, SeatTransaction},
};

/// Key of the transaction-scoped advisory lock that serializes writers.
const VENUE_LOCK_KEY: i64 = 0x5EA7_0001;

/// PostgreSQL-backed seat store implementation.
#[derive(Clone)]
pub struct PostgresSeatStore {
    pool: PgPool,
}

impl PostgresSeatStore {
    /// Creates a new PostgreSQL seat store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool to `database_url`.
    ///
    /// `acquire_timeout` bounds how long any store operation waits for a
    /// connection before failing.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Adds any missing seats in `0..seat_count` as free seats and seeds the
    /// price table if it is empty. Existing assignments are left untouched.
    pub async fn provision(&self, seat_count: u32, prices: PriceTable) -> Result<()> {
        let count = i32::try_from(seat_count)
            .map_err(|_| SeatStoreError::SeatCountOutOfRange(seat_count))?;
        let mut tx = self.pool.begin().await?;

        if seat_count > 0 {
            let inserted = sqlx::query(
                r#"
                INSERT INTO seats (seat)
                SELECT generate_series(0, $1::INTEGER - 1)
                ON CONFLICT (seat) DO NOTHING
                "#,
            )
            .bind(count)
            .execute(&mut *tx)
            .await?
            .rows_affected();
            tracing::debug!(inserted, seat_count, "seats provisioned");
        }

        for class in PriceClass::ALL {
            sqlx::query(
                "INSERT INTO prices (class, price_cents) VALUES ($1, $2) ON CONFLICT (class) DO NOTHING",
            )
            .bind(class.code())
            .bind(prices.unit_price(class).cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Replaces the stored unit prices.
    pub async fn set_prices(&self, prices: PriceTable) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for class in PriceClass::ALL {
            sqlx::query(
                r#"
                INSERT INTO prices (class, price_cents) VALUES ($1, $2)
                ON CONFLICT (class) DO UPDATE SET price_cents = EXCLUDED.price_cents
                "#,
            )
            .bind(class.code())
            .bind(prices.unit_price(class).cents())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    fn row_to_seat(row: PgRow) -> Result<Seat> {
        let number = SeatNumber::new(row.try_get::<i32, _>("seat")?);
        let class: Option<i16> = row.try_get("class")?;
        let customer: Option<String> = row.try_get("customer")?;
        let price: Option<i64> = row.try_get("price_cents")?;

        match (class, customer, price) {
            (None, None, None) => Ok(Seat::free(number)),
            (Some(code), Some(customer), Some(price)) => Ok(Seat::assigned(
                number,
                PriceClass::from_code(code)?,
                CustomerId::new(customer),
                Money::from_cents(price),
            )),
            _ => Err(SeatStoreError::InvalidRow(format!(
                "seat {number} is partially assigned"
            ))),
        }
    }

    fn row_to_order(row: PgRow) -> Result<OrderRecord> {
        Ok(OrderRecord {
            customer: CustomerId::new(row.try_get::<String, _>("customer")?),
            amount: Money::from_cents(row.try_get("amount_cents")?),
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        })
    }
}

async fn fetch_free_seats<'e, E: PgExecutor<'e>>(executor: E) -> Result<Vec<SeatNumber>> {
    let seats: Vec<i32> =
        sqlx::query_scalar("SELECT seat FROM seats WHERE customer IS NULL ORDER BY seat ASC")
            .fetch_all(executor)
            .await?;
    Ok(seats.into_iter().map(SeatNumber::new).collect())
}

async fn fetch_customer_seats<'e, E: PgExecutor<'e>>(
    executor: E,
    customer: &CustomerId,
) -> Result<Vec<Seat>> {
    let rows = sqlx::query(
        r#"
        SELECT seat, class, customer, price_cents FROM seats
        WHERE customer = $1
        ORDER BY seat ASC
        "#,
    )
    .bind(customer.as_str())
    .fetch_all(executor)
    .await?;

    rows.into_iter()
        .map(PostgresSeatStore::row_to_seat)
        .collect()
}

async fn fetch_order<'e, E: PgExecutor<'e>>(
    executor: E,
    customer: Option<&CustomerId>,
) -> Result<Option<OrderRecord>> {
    let row = match customer {
        Some(customer) => {
            sqlx::query("SELECT customer, amount_cents, updated_at FROM orders WHERE customer = $1")
                .bind(customer.as_str())
                .fetch_optional(executor)
                .await?
        }
        None => {
            sqlx::query(
                r#"
                SELECT customer, amount_cents, updated_at
                FROM orders
                ORDER BY updated_at DESC, customer DESC
                LIMIT 1
                "#,
            )
            .fetch_optional(executor)
            .await?
        }
    };

    row.map(PostgresSeatStore::row_to_order).transpose()
}

#[async_trait]
impl SeatStore for PostgresSeatStore {
    type Transaction = PostgresTransaction;

    async fn begin(&self) -> Result<PostgresTransaction> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(VENUE_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        Ok(PostgresTransaction { tx })
    }

    async fn free_seats(&self) -> Result<Vec<SeatNumber>> {
        fetch_free_seats(&self.pool).await
    }

    async fn seats(&self) -> Result<Vec<Seat>> {
        let rows =
            sqlx::query("SELECT seat, class, customer, price_cents FROM seats ORDER BY seat ASC")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Self::row_to_seat).collect()
    }

    async fn seats_for_customer(&self, customer: &CustomerId) -> Result<Vec<Seat>> {
        fetch_customer_seats(&self.pool, customer).await
    }

    async fn latest_order(&self, customer: Option<&CustomerId>) -> Result<Option<OrderRecord>> {
        fetch_order(&self.pool, customer).await
    }

    async fn order_snapshot(&self, customer: Option<&CustomerId>) -> Result<Option<OrderSnapshot>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let snapshot = match fetch_order(&mut *tx, customer).await? {
            Some(order) => {
                let seats = fetch_customer_seats(&mut *tx, &order.customer).await?;
                Some(OrderSnapshot { order, seats })
            }
            None => None,
        };

        tx.commit().await?;
        Ok(snapshot)
    }

    async fn prices(&self) -> Result<PriceTable> {
        let rows = sqlx::query("SELECT class, price_cents FROM prices")
            .fetch_all(&self.pool)
            .await?;

        let mut child = None;
        let mut adult = None;
        for row in rows {
            let class = PriceClass::from_code(row.try_get("class")?)?;
            let price = Money::from_cents(row.try_get("price_cents")?);
            match class {
                PriceClass::Child => child = Some(price),
                PriceClass::Adult => adult = Some(price),
            }
        }

        match (child, adult) {
            (Some(child), Some(adult)) => Ok(PriceTable::new(child, adult)),
            _ => Err(SeatStoreError::MissingPrices),
        }
    }
}

/// Transaction over a [`PostgresSeatStore`].
///
/// Holds the venue advisory lock until it is committed or rolled back.
pub struct PostgresTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl SeatTransaction for PostgresTransaction {
    async fn free_seats(&mut self) -> Result<Vec<SeatNumber>> {
        fetch_free_seats(&mut *self.tx).await
    }

    async fn seats_for_customer(&mut self, customer: &CustomerId) -> Result<Vec<Seat>> {
        fetch_customer_seats(&mut *self.tx, customer).await
    }

    async fn order(&mut self, customer: &CustomerId) -> Result<Option<OrderRecord>> {
        fetch_order(&mut *self.tx, Some(customer)).await
    }

    async fn assign_seat(
        &mut self,
        seat: SeatNumber,
        class: PriceClass,
        price: Money,
        customer: &CustomerId,
    ) -> Result<()> {
        let updated = sqlx::query(
            r#"
            UPDATE seats SET class = $1, customer = $2, price_cents = $3
            WHERE seat = $4 AND customer IS NULL
            "#,
        )
        .bind(class.code())
        .bind(customer.as_str())
        .bind(price.cents())
        .bind(seat.as_i32())
        .execute(&mut *self.tx)
        .await?
        .rows_affected();

        if updated == 1 {
            return Ok(());
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM seats WHERE seat = $1)")
            .bind(seat.as_i32())
            .fetch_one(&mut *self.tx)
            .await?;

        if exists {
            Err(SeatStoreError::SeatConflict { seat })
        } else {
            Err(SeatStoreError::UnknownSeat(seat))
        }
    }

    async fn clear_seats(
        &mut self,
        customer: &CustomerId,
        class: PriceClass,
        limit: ClearLimit,
    ) -> Result<Vec<Seat>> {
        let rows = sqlx::query(
            r#"
            WITH released AS (
                SELECT seat, class, customer, price_cents FROM seats
                WHERE customer = $1 AND class = $2
                ORDER BY seat DESC
                LIMIT $3
                FOR UPDATE
            ), cleared AS (
                UPDATE seats SET class = NULL, customer = NULL, price_cents = NULL
                WHERE seat IN (SELECT seat FROM released)
            )
            SELECT seat, class, customer, price_cents FROM released ORDER BY seat ASC
            "#,
        )
        .bind(customer.as_str())
        .bind(class.code())
        .bind(limit.as_row_limit())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter()
            .map(PostgresSeatStore::row_to_seat)
            .collect()
    }

    async fn upsert_order(
        &mut self,
        customer: &CustomerId,
        delta: Money,
        at: DateTime<Utc>,
    ) -> Result<OrderRecord> {
        let row = sqlx::query(
            r#"
            INSERT INTO orders (customer, amount_cents, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (customer) DO UPDATE SET
                amount_cents = orders.amount_cents + EXCLUDED.amount_cents,
                updated_at = EXCLUDED.updated_at
            RETURNING customer, amount_cents, updated_at
            "#,
        )
        .bind(customer.as_str())
        .bind(delta.cents())
        .bind(at)
        .fetch_one(&mut *self.tx)
        .await?;

        PostgresSeatStore::row_to_order(row)
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
