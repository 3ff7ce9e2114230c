// src/repositories/mod.rs

pub mod memory;
pub mod postgres;
pub mod transaction;

pub use memory::MemoryLedgerStore;
pub use postgres::PostgresLedgerStore;
pub use transaction::{run_transaction, Transaction, TransactionPolicy};
