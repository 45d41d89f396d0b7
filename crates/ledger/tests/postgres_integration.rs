//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p ledger --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use common::{OrderId, ProductId, StoreId};
use ledger::{
    LedgerError, PostgresLedger, Reservation, ReservationLedger, ReservationStatus, StockLedger,
};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for migrations
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!("../../../migrations/001_create_ledger_tables.sql"))
                .execute(&temp_pool)
                .await
                .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh ledger with its own pool and cleared tables
async fn get_test_ledger() -> PostgresLedger {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE stock, inventory_reservation")
        .execute(&pool)
        .await
        .unwrap();

    PostgresLedger::new(pool)
}

#[tokio::test]
async fn test_upsert_and_get() {
    let ledger = get_test_ledger().await;

    let stock = ledger
        .upsert(StoreId::new(1), ProductId::new(10), 25)
        .await
        .unwrap();
    assert_eq!(stock.available_quantity, 25);

    // A second upsert tops the row up rather than replacing it
    let stock = ledger
        .upsert(StoreId::new(1), ProductId::new(10), 5)
        .await
        .unwrap();
    assert_eq!(stock.available_quantity, 30);

    let fetched = ledger
        .get(StoreId::new(1), ProductId::new(10))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.available_quantity, 30);
}

#[tokio::test]
async fn test_try_reserve_success_and_insufficiency() {
    let ledger = get_test_ledger().await;
    ledger
        .upsert(StoreId::new(1), ProductId::new(11), 10)
        .await
        .unwrap();

    assert!(
        ledger
            .try_reserve(StoreId::new(1), ProductId::new(11), 6)
            .await
            .unwrap()
    );
    assert!(
        !ledger
            .try_reserve(StoreId::new(1), ProductId::new(11), 5)
            .await
            .unwrap()
    );

    let stock = ledger
        .get(StoreId::new(1), ProductId::new(11))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stock.available_quantity, 4);
}

#[tokio::test]
async fn test_try_reserve_missing_row() {
    let ledger = get_test_ledger().await;

    let err = ledger
        .try_reserve(StoreId::new(9), ProductId::new(999), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::StockNotFound(_)));
}

#[tokio::test]
async fn test_concurrent_reserves_serialize_on_row_lock() {
    let ledger = get_test_ledger().await;
    ledger
        .upsert(StoreId::new(1), ProductId::new(12), 50)
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..20 {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move {
            ledger
                .try_reserve(StoreId::new(1), ProductId::new(12), 5)
                .await
                .unwrap()
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap() {
            successes += 1;
        }
    }

    // 50 units / 5 per attempt: exactly 10 reservations may win
    assert_eq!(successes, 10);

    let stock = ledger
        .get(StoreId::new(1), ProductId::new(12))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stock.available_quantity, 0);
}

#[tokio::test]
async fn test_release_restores_quantity() {
    let ledger = get_test_ledger().await;
    ledger
        .upsert(StoreId::new(1), ProductId::new(13), 10)
        .await
        .unwrap();

    ledger
        .try_reserve(StoreId::new(1), ProductId::new(13), 7)
        .await
        .unwrap();
    ledger.release(ProductId::new(13), 7).await.unwrap();

    let stock = ledger
        .get(StoreId::new(1), ProductId::new(13))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stock.available_quantity, 10);
}

#[tokio::test]
async fn test_release_missing_row() {
    let ledger = get_test_ledger().await;

    let err = ledger.release(ProductId::new(404), 1).await.unwrap_err();
    assert!(matches!(err, LedgerError::StockNotFound(_)));
}

#[tokio::test]
async fn test_reservation_lifecycle() {
    let ledger = get_test_ledger().await;

    let order_id = OrderId::new(2001);
    let reservation = Reservation::new(order_id, ProductId::new(14), 3);
    let id = reservation.id;
    ledger.append(reservation).await.unwrap();

    let found = ledger.find_by_order(order_id).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].status, ReservationStatus::Reserved);
    assert_eq!(found[0].reserved_quantity, 3);

    // The flip happens exactly once
    assert!(ledger.mark_canceled(id).await.unwrap());
    assert!(!ledger.mark_canceled(id).await.unwrap());

    let found = ledger.find_by_order(order_id).await.unwrap();
    assert_eq!(found[0].status, ReservationStatus::Canceled);
}

#[tokio::test]
async fn test_find_by_order_returns_all_statuses() {
    let ledger = get_test_ledger().await;

    let order_id = OrderId::new(2002);
    let first = Reservation::new(order_id, ProductId::new(15), 1);
    let second = Reservation::new(order_id, ProductId::new(16), 2);
    let first_id = first.id;
    ledger.append(first).await.unwrap();
    ledger.append(second).await.unwrap();
    ledger.mark_canceled(first_id).await.unwrap();

    let found = ledger.find_by_order(order_id).await.unwrap();
    assert_eq!(found.len(), 2);

    // Unrelated orders stay invisible
    let other = ledger.find_by_order(OrderId::new(9999)).await.unwrap();
    assert!(other.is_empty());
}

#[tokio::test]
async fn test_set_quantity_and_negative_rejection() {
    let ledger = get_test_ledger().await;
    ledger
        .upsert(StoreId::new(1), ProductId::new(17), 10)
        .await
        .unwrap();

    let stock = ledger
        .set_quantity(StoreId::new(1), ProductId::new(17), 2)
        .await
        .unwrap();
    assert_eq!(stock.available_quantity, 2);

    let err = ledger
        .set_quantity(StoreId::new(1), ProductId::new(17), -4)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NegativeQuantity(-4)));
}
