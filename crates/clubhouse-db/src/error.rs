//! Store error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// A principal, relation or message reference does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request is well-formed but violates a message or identifier rule.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Reserved for non-idempotent uniqueness violations. Relation adds never
    /// produce it.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("DB lock poisoned: {0}")]
    LockPoisoned(String),

    /// A stored value could not be decoded (bad timestamp, unknown kind).
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
