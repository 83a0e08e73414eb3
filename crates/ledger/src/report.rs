//! Client and order item snapshots.

use serde::Serialize;
use sqlx::{Row, sqlite::SqliteRow};

use crate::{ClientId, ItemId, OrderId, Result};

/// A client row as read inside the current transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientSnapshot {
    pub id: ClientId,
    pub login: String,
    pub account: i64,
}

impl ClientSnapshot {
    pub(crate) fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            id: ClientId::new(row.try_get("id")?),
            login: row.try_get("login")?,
            account: row.try_get("account")?,
        })
    }
}

impl std::fmt::Display for ClientSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Client login: {}, client account: {}",
            self.login, self.account
        )
    }
}

/// An order item row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderItemSnapshot {
    pub client_id: ClientId,
    pub order_id: OrderId,
    pub item_id: ItemId,
}

impl OrderItemSnapshot {
    pub(crate) fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(Self {
            client_id: ClientId::new(row.try_get("client_id")?),
            order_id: OrderId::new(row.try_get("order_id")?),
            item_id: ItemId::new(row.try_get("item_id")?),
        })
    }
}

impl std::fmt::Display for OrderItemSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Order id: {}, item id: {}", self.order_id, self.item_id)
    }
}

/// A client together with its order items.
///
/// Items are kept in the order the backend returned them, which is unspecified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientReport {
    pub client: ClientSnapshot,
    pub items: Vec<OrderItemSnapshot>,
}

impl ClientReport {
    pub fn account(&self) -> i64 {
        self.client.account
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

/// One line for the client, then one line per order item.
impl std::fmt::Display for ClientReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.client)?;
        for item in &self.items {
            write!(f, "\n{item}")?;
        }
        Ok(())
    }
}
