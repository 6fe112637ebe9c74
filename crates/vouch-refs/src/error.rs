//! Error types for reference operations.

use thiserror::Error;
use vouch_types::ObjectId;

/// Errors that can occur during reference operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// The reference was not found.
    #[error("ref not found: {name}")]
    NotFound { name: String },

    /// The reference name is invalid.
    #[error("invalid ref name: {name}: {reason}")]
    InvalidRefName { name: String, reason: String },

    /// A compare-and-swap saw a different current value.
    #[error("ref {name} moved: expected {}, found {}", show(.expected), show(.actual))]
    Conflict {
        name: String,
        expected: Option<ObjectId>,
        actual: Option<ObjectId>,
    },

    /// Another writer holds the lock file for this ref.
    #[error("ref {name} is locked by another writer")]
    Locked { name: String },

    /// A ref file does not contain a valid target.
    #[error("corrupt ref {name}: {reason}")]
    Corrupt { name: String, reason: String },

    /// A lock guarding in-memory state was poisoned by a panic.
    #[error("ref store lock poisoned")]
    LockPoisoned,

    /// I/O error during file-based ref operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn show(id: &Option<ObjectId>) -> String {
    id.map_or_else(|| "(none)".to_string(), |id| id.short_hex())
}

/// Convenience type alias for ref operations.
pub type RefResult<T> = std::result::Result<T, RefError>;
