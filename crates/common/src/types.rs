use serde::{Deserialize, Serialize};

/// Identifier of a row in the `clients` table.
///
/// Wraps the integer key to keep client ids from being mixed up with
/// order or item ids when binding statement parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(i64);

impl ClientId {
    /// Creates a client ID from its integer key.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying integer key.
    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ClientId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<ClientId> for i64 {
    fn from(id: ClientId) -> Self {
        id.0
    }
}

/// Identifier of an order. Several order items share one order id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(i64);

impl OrderId {
    /// Creates an order ID from its integer key.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying integer key.
    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for OrderId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<OrderId> for i64 {
    fn from(id: OrderId) -> Self {
        id.0
    }
}

/// Catalog item identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(i64);

impl ItemId {
    /// Creates an item ID from its integer key.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying integer key.
    pub const fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<ItemId> for i64 {
    fn from(id: ItemId) -> Self {
        id.0
    }
}
