//! Transaction state machine.

/// The state of the session's current transaction.
///
/// State transitions:
/// ```text
/// NoTransaction ──► Open ──┬──► Committed
///                          └──► RolledBack
/// ```
/// With auto-commit disabled, a terminal state moves back to `Open` as soon as
/// the next statement runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransactionState {
    /// Auto-commit mode, or no transaction has been started yet.
    #[default]
    NoTransaction,

    /// Statements are grouped until an explicit commit or rollback.
    Open,

    /// The last transaction was committed (terminal state).
    Committed,

    /// The last transaction was rolled back (terminal state).
    RolledBack,
}

impl TransactionState {
    /// Returns true if a transaction is currently open.
    pub fn is_open(&self) -> bool {
        matches!(self, TransactionState::Open)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionState::Committed | TransactionState::RolledBack)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionState::NoTransaction => "NoTransaction",
            TransactionState::Open => "Open",
            TransactionState::Committed => "Committed",
            TransactionState::RolledBack => "RolledBack",
        }
    }
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
