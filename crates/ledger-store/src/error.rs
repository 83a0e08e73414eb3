use thiserror::Error;

use crate::ClientId;

/// Errors raised by the storage backend or by misuse of transaction control.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The savepoint was released, rolled past, or belongs to a finished transaction.
    #[error("Savepoint '{name}' is no longer valid")]
    SavepointInvalidated { name: String },

    /// A live savepoint with the same name already exists in the open transaction.
    #[error("Savepoint '{name}' already exists in the current transaction")]
    DuplicateSavepoint { name: String },

    /// Savepoint names are restricted to ASCII letters, digits and underscores.
    #[error("Invalid savepoint name: '{name}'")]
    InvalidSavepointName { name: String },

    /// The operation needs an explicit transaction but auto-commit is enabled.
    #[error("Cannot {operation} while auto-commit is enabled")]
    AutoCommitEnabled { operation: &'static str },

    /// The client row does not exist.
    #[error("Client not found: {0}")]
    ClientNotFound(ClientId),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
