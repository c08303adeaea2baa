//! Repository Module
//!
//! CRUD operations over the SQLite tables. The only layer that talks
//! to the backing store; services never issue SQL themselves.

pub mod appointment;
pub mod encounter;
pub mod order;
pub mod user;

use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        // UNIQUE violations carry meaning here (one encounter per order /
        // per appointment context), so keep them distinguishable.
        if let sqlx::Error::Database(ref db) = err
            && db.is_unique_violation()
        {
            return RepoError::Duplicate(db.message().to_string());
        }
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
