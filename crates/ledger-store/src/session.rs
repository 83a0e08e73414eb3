use sqlx::{Connection, SqliteConnection};

use crate::{Result, SavepointHandle, SavepointStack, StorageError, TransactionState};

/// Private in-memory database that lives as long as its connection.
pub const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";

/// A single exclusively-owned connection with explicit transaction control.
///
/// The session starts in auto-commit mode. After
/// [`begin_manual_transaction`](Self::begin_manual_transaction) every statement
/// issued through [`connection`](Self::connection) belongs to an open
/// transaction until [`commit`](Self::commit) or [`rollback`](Self::rollback);
/// the next statement after either opens a new one.
pub struct LedgerSession {
    conn: SqliteConnection,
    auto_commit: bool,
    state: TransactionState,
    savepoints: SavepointStack,
}

impl LedgerSession {
    /// Opens a connection to the given database URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let conn = SqliteConnection::connect(url).await?;
        tracing::debug!(%url, "ledger connection opened");
        Ok(Self::from_connection(conn))
    }

    /// Wraps an already open connection. The connection must not be inside a transaction.
    pub fn from_connection(conn: SqliteConnection) -> Self {
        Self {
            conn,
            auto_commit: true,
            state: TransactionState::NoTransaction,
            savepoints: SavepointStack::new(),
        }
    }

    /// Returns the state of the current transaction.
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Returns true if every statement is committed on its own.
    pub fn is_auto_commit(&self) -> bool {
        self.auto_commit
    }

    /// Returns the live savepoints of the open transaction, oldest first.
    pub fn savepoints(&self) -> impl Iterator<Item = &SavepointHandle> {
        self.savepoints.iter()
    }

    /// Returns the connection for statement execution.
    ///
    /// With auto-commit disabled this opens a transaction first if none is open.
    pub async fn connection(&mut self) -> Result<&mut SqliteConnection> {
        if !self.auto_commit && !self.state.is_open() {
            self.open_transaction().await?;
        }
        Ok(&mut self.conn)
    }

    /// Disables auto-commit and opens a transaction.
    ///
    /// Does nothing if a transaction is already open.
    #[tracing::instrument(skip(self))]
    pub async fn begin_manual_transaction(&mut self) -> Result<()> {
        self.auto_commit = false;
        if !self.state.is_open() {
            self.open_transaction().await?;
        }
        Ok(())
    }

    /// Switches auto-commit on or off.
    ///
    /// Turning auto-commit on commits the open transaction, if any.
    pub async fn set_auto_commit(&mut self, enabled: bool) -> Result<()> {
        if !enabled {
            return self.begin_manual_transaction().await;
        }
        if self.state.is_open() {
            self.commit().await?;
        }
        self.auto_commit = true;
        tracing::debug!("auto-commit enabled");
        Ok(())
    }

    /// Commits all statements since the last transaction boundary.
    #[tracing::instrument(skip(self))]
    pub async fn commit(&mut self) -> Result<()> {
        self.require_manual("commit")?;
        if self.state.is_open() {
            self.execute_control("COMMIT").await?;
            metrics::counter!("ledger_transactions_committed").increment(1);
        }
        self.finish(TransactionState::Committed);
        tracing::debug!("transaction committed");
        Ok(())
    }

    /// Discards all statements since the last transaction boundary.
    #[tracing::instrument(skip(self))]
    pub async fn rollback(&mut self) -> Result<()> {
        self.require_manual("roll back")?;
        if self.state.is_open() {
            self.execute_control("ROLLBACK").await?;
            metrics::counter!("ledger_transactions_rolled_back").increment(1);
        }
        self.finish(TransactionState::RolledBack);
        tracing::debug!("transaction rolled back");
        Ok(())
    }

    /// Marks a point in the open transaction that a later partial rollback can return to.
    #[tracing::instrument(skip(self))]
    pub async fn create_savepoint(&mut self, name: &str) -> Result<SavepointHandle> {
        self.require_manual("create a savepoint")?;
        self.savepoints.validate_name(name)?;
        if !self.state.is_open() {
            self.open_transaction().await?;
        }
        self.execute_control(&format!("SAVEPOINT \"{name}\"")).await?;

        let handle = self.savepoints.push(name);
        tracing::debug!(savepoint = %handle, depth = self.savepoints.len(), "savepoint created");
        Ok(handle)
    }

    /// Undoes everything issued after `handle` and keeps the transaction open.
    ///
    /// The savepoint itself stays valid; savepoints created after it do not.
    #[tracing::instrument(skip(self, handle), fields(savepoint = %handle))]
    pub async fn rollback_to(&mut self, handle: &SavepointHandle) -> Result<()> {
        let position = self.savepoints.position(handle)?;
        self.execute_control(&format!("ROLLBACK TO SAVEPOINT \"{}\"", handle.name()))
            .await?;
        self.savepoints.rolled_back_to(position);

        metrics::counter!("ledger_savepoint_rollbacks").increment(1);
        tracing::debug!(depth = self.savepoints.len(), "rolled back to savepoint");
        Ok(())
    }

    /// Forgets `handle` and every savepoint created after it. Data is not affected.
    #[tracing::instrument(skip(self, handle), fields(savepoint = %handle))]
    pub async fn release_savepoint(&mut self, handle: &SavepointHandle) -> Result<()> {
        let position = self.savepoints.position(handle)?;
        self.execute_control(&format!("RELEASE SAVEPOINT \"{}\"", handle.name()))
            .await?;
        self.savepoints.released(position);

        tracing::debug!(depth = self.savepoints.len(), "savepoint released");
        Ok(())
    }

    /// Closes the connection, rolling back a transaction that is still open.
    pub async fn close(mut self) -> Result<()> {
        if self.state.is_open() {
            match self.execute_control("ROLLBACK").await {
                Ok(()) => tracing::debug!("open transaction rolled back on close"),
                Err(e) => tracing::warn!(error = %e, "rollback on close failed"),
            }
        }
        self.conn.close().await?;
        tracing::debug!("ledger connection closed");
        Ok(())
    }

    async fn open_transaction(&mut self) -> Result<()> {
        self.execute_control("BEGIN").await?;
        self.state = TransactionState::Open;
        self.savepoints.clear();
        tracing::debug!("transaction opened");
        Ok(())
    }

    fn finish(&mut self, state: TransactionState) {
        self.state = state;
        self.savepoints.clear();
    }

    fn require_manual(&self, operation: &'static str) -> Result<()> {
        if self.auto_commit {
            return Err(StorageError::AutoCommitEnabled { operation });
        }
        Ok(())
    }

    async fn execute_control(&mut self, sql: &str) -> Result<()> {
        sqlx::raw_sql(sql).execute(&mut self.conn).await?;
        Ok(())
    }
}

impl std::fmt::Debug for LedgerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerSession")
            .field("auto_commit", &self.auto_commit)
            .field("state", &self.state)
            .field("savepoints", &self.savepoints)
            .finish_non_exhaustive()
    }
}
