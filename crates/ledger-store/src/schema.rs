//! Schema bootstrap and fixture seeding.
//!
//! Both functions run on whatever transaction the connection is in; call them
//! in auto-commit mode to have them take effect immediately.

use sqlx::SqliteConnection;

use crate::{ClientId, Result};

const CREATE_LEDGER_TABLES: &str = include_str!("../../../migrations/001_create_ledger_tables.sql");

/// A client row to (re)create before a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSeed {
    pub id: ClientId,
    pub login: String,
    pub account: i64,
}

impl ClientSeed {
    pub fn new(id: ClientId, login: impl Into<String>, account: i64) -> Self {
        Self {
            id,
            login: login.into(),
            account,
        }
    }
}

impl Default for ClientSeed {
    fn default() -> Self {
        Self::new(ClientId::new(1), "test", 675)
    }
}

/// Creates the `clients` and `order_items` tables if they do not exist.
pub async fn bootstrap(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::raw_sql(CREATE_LEDGER_TABLES).execute(&mut *conn).await?;
    tracing::debug!("ledger schema ready");
    Ok(())
}

/// Resets one client: removes its order items and upserts its row.
pub async fn seed_client(conn: &mut SqliteConnection, seed: &ClientSeed) -> Result<()> {
    sqlx::query("DELETE FROM order_items WHERE client_id = ?")
        .bind(seed.id.as_i64())
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO clients (id, login, account)
        VALUES (?, ?, ?)
        ON CONFLICT (id) DO UPDATE SET
            login = excluded.login,
            account = excluded.account
        "#,
    )
    .bind(seed.id.as_i64())
    .bind(&seed.login)
    .bind(seed.account)
    .execute(&mut *conn)
    .await?;

    tracing::debug!(client_id = %seed.id, account = seed.account, "client seeded");
    Ok(())
}
