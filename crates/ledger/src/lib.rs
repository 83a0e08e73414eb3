//! Order ledger on top of [`ledger_store`].
//!
//! This crate provides:
//! - `AddOrder`: one order item insertion paired with one balance decrement
//! - `ClientReport`: the client row and its order items as seen by the open transaction
//! - `OrderLedger`: runs both against a `LedgerSession` and forwards its transaction control

pub mod orders;
pub mod report;
pub mod service;

pub use common::{ClientId, ItemId, OrderId};
pub use ledger_store::{
    ClientSeed, DEFAULT_DATABASE_URL, LedgerSession, Result, SavepointHandle, StorageError,
    TransactionState,
};
pub use orders::{AddOrder, ORDER_PRICE};
pub use report::{ClientReport, ClientSnapshot, OrderItemSnapshot};
pub use service::OrderLedger;
