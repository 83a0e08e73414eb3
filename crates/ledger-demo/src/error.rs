//! Scenario error types.

use ledger::StorageError;
use thiserror::Error;

use crate::scenario::Stage;

/// Errors that end a scenario run.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The storage backend failed.
    #[error("{0}")]
    Storage(#[from] StorageError),

    /// Writing a checkpoint to the output failed.
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    /// Encoding a checkpoint as JSON failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A checkpoint did not show the balance or item count the scenario implies.
    #[error(
        "Unexpected state at '{stage}': expected account {expected_account} with {expected_items} items, found {actual_account} with {actual_items}"
    )]
    UnexpectedState {
        stage: Stage,
        expected_account: i64,
        expected_items: usize,
        actual_account: i64,
        actual_items: usize,
    },
}

impl ScenarioError {
    /// The single line printed when a run fails.
    ///
    /// Backend errors are shown with the driver's own message.
    pub fn failure_line(&self) -> String {
        match self {
            ScenarioError::Storage(StorageError::Database(err)) => {
                format!("Database connection failure: {err}")
            }
            ScenarioError::Storage(err) => format!("Database connection failure: {err}"),
            other => format!("Scenario failed: {other}"),
        }
    }
}

/// Convenience type alias for scenario results.
pub type Result<T> = std::result::Result<T, ScenarioError>;
