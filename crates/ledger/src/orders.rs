//! Order item commands.

use serde::{Deserialize, Serialize};

use crate::{ClientId, ItemId, OrderId};

/// Price charged against the client's account for every order item.
pub const ORDER_PRICE: i64 = 50;

/// Adds one item to a client's order and charges the order price.
///
/// The insertion and the balance decrement are only paired by convention;
/// nothing in the schema ties them together, so both must run in the same
/// transaction and be committed or rolled back together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOrder {
    pub client_id: ClientId,
    pub order_id: OrderId,
    pub item_id: ItemId,
}

impl AddOrder {
    pub fn new(client_id: ClientId, order_id: OrderId, item_id: ItemId) -> Self {
        Self {
            client_id,
            order_id,
            item_id,
        }
    }

    /// Returns a copy of this command for a different item.
    pub fn with_item(self, item_id: ItemId) -> Self {
        Self { item_id, ..self }
    }
}
