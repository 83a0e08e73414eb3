//! Order ledger service.

use futures_util::TryStreamExt;
use ledger_store::schema;

use crate::{
    AddOrder, ClientId, ClientReport, ClientSeed, ClientSnapshot, LedgerSession, ORDER_PRICE,
    OrderItemSnapshot, Result, SavepointHandle, StorageError,
};

/// Runs order mutations and reports against one [`LedgerSession`].
///
/// None of the operations commit on their own: every statement goes to the
/// session's current transaction and the caller decides where its
/// boundaries are.
#[derive(Debug)]
pub struct OrderLedger {
    session: LedgerSession,
    order_price: i64,
}

impl OrderLedger {
    /// Creates a ledger charging [`ORDER_PRICE`] per item.
    pub fn new(session: LedgerSession) -> Self {
        Self {
            session,
            order_price: ORDER_PRICE,
        }
    }

    /// Opens a session on `url` and wraps it.
    pub async fn connect(url: &str) -> Result<Self> {
        Ok(Self::new(LedgerSession::connect(url).await?))
    }

    /// Overrides the price charged per order item.
    pub fn with_order_price(mut self, order_price: i64) -> Self {
        self.order_price = order_price;
        self
    }

    pub fn order_price(&self) -> i64 {
        self.order_price
    }

    /// Returns the underlying session.
    pub fn session(&self) -> &LedgerSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut LedgerSession {
        &mut self.session
    }

    /// Creates the schema if needed and resets the given client fixture.
    ///
    /// Runs in the session's current mode; in auto-commit mode the fixture is
    /// committed immediately.
    pub async fn setup(&mut self, seed: &ClientSeed) -> Result<()> {
        let conn = self.session.connection().await?;
        schema::bootstrap(conn).await?;
        schema::seed_client(conn, seed).await
    }

    /// Inserts the order item and charges the order price to the client.
    ///
    /// Returns the client's new balance. Nothing is committed here.
    #[tracing::instrument(skip(self), fields(price = self.order_price))]
    pub async fn add_order(&mut self, cmd: &AddOrder) -> Result<i64> {
        let price = self.order_price;
        let conn = self.session.connection().await?;

        let exists = sqlx::query("SELECT 1 FROM clients WHERE id = ?")
            .bind(cmd.client_id.as_i64())
            .fetch_optional(&mut *conn)
            .await?;
        if exists.is_none() {
            return Err(StorageError::ClientNotFound(cmd.client_id));
        }

        sqlx::query("INSERT INTO order_items (client_id, order_id, item_id) VALUES (?, ?, ?)")
            .bind(cmd.client_id.as_i64())
            .bind(cmd.order_id.as_i64())
            .bind(cmd.item_id.as_i64())
            .execute(&mut *conn)
            .await?;

        // Read and write the balance in one statement of the same transaction.
        let balances: Vec<i64> = sqlx::query_scalar(
            r#"
            UPDATE clients
            SET account = account - ?
            WHERE id = ?
            RETURNING account
            "#,
        )
        .bind(price)
        .bind(cmd.client_id.as_i64())
        .fetch_all(&mut *conn)
        .await?;
        let balance = balances
            .into_iter()
            .next()
            .ok_or(StorageError::ClientNotFound(cmd.client_id))?;

        metrics::counter!("ledger_orders_added").increment(1);
        tracing::debug!(balance, "order item added");
        Ok(balance)
    }

    /// Reads the client row and all of its order items.
    ///
    /// Sees the uncommitted writes of the session's own transaction.
    #[tracing::instrument(skip(self))]
    pub async fn client_report(&mut self, client_id: ClientId) -> Result<ClientReport> {
        let conn = self.session.connection().await?;

        let row = sqlx::query("SELECT id, login, account FROM clients WHERE id = ?")
            .bind(client_id.as_i64())
            .fetch_optional(&mut *conn)
            .await?;
        let client = match row {
            Some(row) => ClientSnapshot::from_row(&row)?,
            None => return Err(StorageError::ClientNotFound(client_id)),
        };

        let mut rows =
            sqlx::query("SELECT client_id, order_id, item_id FROM order_items WHERE client_id = ?")
                .bind(client_id.as_i64())
                .fetch(&mut *conn);
        let mut items = Vec::new();
        while let Some(row) = rows.try_next().await? {
            items.push(OrderItemSnapshot::from_row(&row)?);
        }

        Ok(ClientReport { client, items })
    }

    pub async fn begin_manual_transaction(&mut self) -> Result<()> {
        self.session.begin_manual_transaction().await
    }

    pub async fn commit(&mut self) -> Result<()> {
        self.session.commit().await
    }

    pub async fn rollback(&mut self) -> Result<()> {
        self.session.rollback().await
    }

    pub async fn create_savepoint(&mut self, name: &str) -> Result<SavepointHandle> {
        self.session.create_savepoint(name).await
    }

    pub async fn rollback_to(&mut self, savepoint: &SavepointHandle) -> Result<()> {
        self.session.rollback_to(savepoint).await
    }

    pub async fn release_savepoint(&mut self, savepoint: &SavepointHandle) -> Result<()> {
        self.session.release_savepoint(savepoint).await
    }

    /// Closes the underlying connection.
    pub async fn close(self) -> Result<()> {
        self.session.close().await
    }
}
