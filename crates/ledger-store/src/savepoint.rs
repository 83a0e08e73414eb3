//! Savepoint bookkeeping for an open transaction.

use crate::{Result, StorageError};

/// A handle to a savepoint created in the current transaction.
///
/// Each handle carries a session-unique id, so a stale handle never matches a
/// later savepoint that happens to reuse its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SavepointHandle {
    id: u64,
    name: String,
}

impl SavepointHandle {
    /// Returns the savepoint name as sent to the backend.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the session-unique id of this savepoint.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl std::fmt::Display for SavepointHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Ordered stack of live savepoints.
///
/// Rolling back to or releasing a savepoint invalidates every savepoint
/// created after it.
#[derive(Debug, Default)]
pub struct SavepointStack {
    live: Vec<SavepointHandle>,
    next_id: u64,
}

impl SavepointStack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks that `name` can be pushed without touching the stack.
    pub fn validate_name(&self, name: &str) -> Result<()> {
        let well_formed = !name.is_empty()
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !name.starts_with(|c: char| c.is_ascii_digit());
        if !well_formed {
            return Err(StorageError::InvalidSavepointName {
                name: name.to_string(),
            });
        }
        if self.live.iter().any(|sp| sp.name == name) {
            return Err(StorageError::DuplicateSavepoint {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Pushes a new savepoint and returns its handle.
    ///
    /// Callers must run [`validate_name`](Self::validate_name) first.
    pub fn push(&mut self, name: &str) -> SavepointHandle {
        self.next_id += 1;
        let handle = SavepointHandle {
            id: self.next_id,
            name: name.to_string(),
        };
        self.live.push(handle.clone());
        handle
    }

    /// Returns the stack position of a live savepoint.
    pub fn position(&self, handle: &SavepointHandle) -> Result<usize> {
        self.live
            .iter()
            .position(|sp| sp.id == handle.id)
            .ok_or_else(|| StorageError::SavepointInvalidated {
                name: handle.name.clone(),
            })
    }

    /// Drops every savepoint above `position`, keeping the one at `position`.
    pub fn rolled_back_to(&mut self, position: usize) {
        self.live.truncate(position + 1);
    }

    /// Drops the savepoint at `position` and every savepoint above it.
    pub fn released(&mut self, position: usize) {
        self.live.truncate(position);
    }

    /// Forgets all savepoints. Ids keep increasing.
    pub fn clear(&mut self) {
        self.live.clear();
    }

    /// Returns the live savepoints, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &SavepointHandle> {
        self.live.iter()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
