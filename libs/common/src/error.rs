//! Custom error types for the common library
//!
//! This module defines the data-layer error type shared by every service.
//! Store adapters return [`DatabaseResult`]; services map it onto their own
//! HTTP error type.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Postgres SQLSTATE for `unique_violation`
const UNIQUE_VIOLATION: &str = "23505";

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred while applying the schema
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),

    /// A uniqueness constraint rejected the write
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl DatabaseError {
    /// Map a query error, turning unique violations into [`DatabaseError::Conflict`]
    pub fn from_query(error: SqlxError, conflict_message: &str) -> Self {
        if is_unique_violation(&error) {
            DatabaseError::Conflict(conflict_message.to_string())
        } else {
            DatabaseError::Query(error)
        }
    }
}

impl From<SqlxError> for DatabaseError {
    fn from(error: SqlxError) -> Self {
        DatabaseError::Query(error)
    }
}

/// Check whether a sqlx error is a unique constraint violation
pub fn is_unique_violation(error: &SqlxError) -> bool {
    match error {
        SqlxError::Database(db) => db.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
