//! Identifier types shared by the order ledger crates.

pub mod types;

pub use types::{ClientId, ItemId, OrderId};
