use async_trait::async_trait;
use common::{OrderId, ProductId, StoreId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{LedgerError, Result};
use crate::reservation::{Reservation, ReservationLedger, ReservationStatus};
use crate::stock::{Stock, StockLedger};

/// PostgreSQL-backed implementation of both ledgers.
///
/// `try_reserve` takes a `SELECT … FOR UPDATE` row lock so that concurrent
/// reservations against the same (store, product) row serialize; the schema
/// additionally carries a `CHECK (available_quantity >= 0)` constraint as a
/// last line of defense.
#[derive(Clone)]
pub struct PostgresLedger {
    pool: PgPool,
}

impl PostgresLedger {
    /// Creates a new PostgreSQL ledger.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_stock(row: PgRow) -> Result<Stock> {
        Ok(Stock {
            store_id: StoreId::new(row.try_get("store_id")?),
            product_id: ProductId::new(row.try_get("product_id")?),
            available_quantity: row.try_get("available_quantity")?,
            last_updated: row.try_get("last_updated")?,
        })
    }

    fn row_to_reservation(row: PgRow) -> Result<Reservation> {
        let status_name: String = row.try_get("status")?;
        let status = ReservationStatus::parse(&status_name)
            .ok_or_else(|| LedgerError::Decode(format!("unknown status '{status_name}'")))?;

        Ok(Reservation {
            id: row.try_get::<Uuid, _>("id")?,
            order_id: OrderId::new(row.try_get("order_id")?),
            product_id: ProductId::new(row.try_get("product_id")?),
            reserved_quantity: row.try_get("reserved_quantity")?,
            status,
            last_updated: row.try_get("last_updated")?,
        })
    }
}

#[async_trait]
impl StockLedger for PostgresLedger {
    async fn get(&self, store_id: StoreId, product_id: ProductId) -> Result<Option<Stock>> {
        let row = sqlx::query(
            r#"
            SELECT store_id, product_id, available_quantity, last_updated
            FROM stock
            WHERE store_id = $1 AND product_id = $2
            "#,
        )
        .bind(store_id.value())
        .bind(product_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_stock).transpose()
    }

    async fn list_by_store(&self, store_id: StoreId) -> Result<Vec<Stock>> {
        let rows = sqlx::query(
            r#"
            SELECT store_id, product_id, available_quantity, last_updated
            FROM stock
            WHERE store_id = $1
            ORDER BY product_id ASC
            "#,
        )
        .bind(store_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_stock).collect()
    }

    async fn upsert(
        &self,
        store_id: StoreId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Stock> {
        if quantity < 0 {
            return Err(LedgerError::NegativeQuantity(quantity));
        }

        let row = sqlx::query(
            r#"
            INSERT INTO stock (store_id, product_id, available_quantity, last_updated)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (store_id, product_id) DO UPDATE
            SET available_quantity = stock.available_quantity + EXCLUDED.available_quantity,
                last_updated = now()
            RETURNING store_id, product_id, available_quantity, last_updated
            "#,
        )
        .bind(store_id.value())
        .bind(product_id.value())
        .bind(quantity)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_stock(row)
    }

    async fn set_quantity(
        &self,
        store_id: StoreId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Stock> {
        if quantity < 0 {
            return Err(LedgerError::NegativeQuantity(quantity));
        }

        let row = sqlx::query(
            r#"
            UPDATE stock
            SET available_quantity = $3, last_updated = now()
            WHERE store_id = $1 AND product_id = $2
            RETURNING store_id, product_id, available_quantity, last_updated
            "#,
        )
        .bind(store_id.value())
        .bind(product_id.value())
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(LedgerError::StockNotFound(product_id))?;

        Self::row_to_stock(row)
    }

    async fn try_reserve(
        &self,
        store_id: StoreId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        // Lock the single (store, product) row for the duration of the
        // check-and-decrement; a concurrent reservation on the same row
        // blocks here until this transaction commits.
        let available: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT available_quantity
            FROM stock
            WHERE store_id = $1 AND product_id = $2
            FOR UPDATE
            "#,
        )
        .bind(store_id.value())
        .bind(product_id.value())
        .fetch_optional(&mut *tx)
        .await?;

        let available = available.ok_or(LedgerError::StockNotFound(product_id))?;

        if available < quantity {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            UPDATE stock
            SET available_quantity = available_quantity - $3, last_updated = now()
            WHERE store_id = $1 AND product_id = $2
            "#,
        )
        .bind(store_id.value())
        .bind(product_id.value())
        .bind(quantity)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(%store_id, %product_id, quantity, "stock reserved");
        Ok(true)
    }

    async fn release(&self, product_id: ProductId, quantity: i64) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE stock
            SET available_quantity = available_quantity + $2, last_updated = now()
            WHERE product_id = $1
            "#,
        )
        .bind(product_id.value())
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::StockNotFound(product_id));
        }
        Ok(())
    }
}

#[async_trait]
impl ReservationLedger for PostgresLedger {
    async fn append(&self, reservation: Reservation) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO inventory_reservation
                (id, order_id, product_id, reserved_quantity, status, last_updated)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(reservation.id)
        .bind(reservation.order_id.value())
        .bind(reservation.product_id.value())
        .bind(reservation.reserved_quantity)
        .bind(reservation.status.as_str())
        .bind(reservation.last_updated)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_order(&self, order_id: OrderId) -> Result<Vec<Reservation>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, reserved_quantity, status, last_updated
            FROM inventory_reservation
            WHERE order_id = $1
            ORDER BY last_updated ASC, id ASC
            "#,
        )
        .bind(order_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_reservation).collect()
    }

    async fn mark_canceled(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE inventory_reservation
            SET status = 'CANCELED', last_updated = now()
            WHERE id = $1 AND status = 'RESERVED'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
