//! Durable ledgers backing the inventory reservation saga.
//!
//! Two ledgers make up the system of record for the saga's effects:
//! - the **stock ledger**, a per-(store, product) available-quantity counter
//!   with an atomic check-and-decrement (`try_reserve`) and an unconditional
//!   increment (`release`);
//! - the **reservation ledger**, an append/update log of per-item
//!   reservations whose status moves `Reserved → Canceled` exactly once.
//!
//! Both ledgers exist as an in-memory implementation (tests, local runs) and
//! a PostgreSQL implementation with row-level locking.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod reservation;
pub mod stock;

pub use error::{LedgerError, Result};
pub use memory::InMemoryLedger;
pub use postgres::PostgresLedger;
pub use reservation::{Reservation, ReservationLedger, ReservationStatus};
pub use stock::{Stock, StockLedger};
