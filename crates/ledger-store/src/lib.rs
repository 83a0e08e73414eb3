//! Storage backend for the order ledger.
//!
//! Wraps a single SQLite connection in a [`LedgerSession`] that drives
//! auto-commit, commit/rollback and named savepoints explicitly, and keeps
//! track of which savepoints are still valid.

pub mod error;
pub mod savepoint;
pub mod schema;
pub mod session;
pub mod state;

pub use common::{ClientId, ItemId, OrderId};
pub use error::{Result, StorageError};
pub use savepoint::{SavepointHandle, SavepointStack};
pub use schema::ClientSeed;
pub use session::{DEFAULT_DATABASE_URL, LedgerSession};
pub use state::TransactionState;
