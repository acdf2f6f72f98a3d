//! Database error types
//!
//! `DatabaseError` is the crate's own error vocabulary; adapters translate it
//! into the port error the caller speaks (`RepositoryError`,
//! `EventStoreError`). PostgreSQL constraint violations are recognised by
//! their SQLSTATE codes so callers can branch on the kind of failure rather
//! than parse messages.

use system_events::RepositoryError;
use thiserror::Error;

/// Errors surfaced by the PostgreSQL adapters
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Unique constraint violation (SQLSTATE 23505)
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Foreign key constraint violation (SQLSTATE 23503)
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation (SQLSTATE 23514)
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Row decoding failed: {0}")]
    Decode(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),
}

impl DatabaseError {
    /// Maps a raw sqlx error onto the crate vocabulary
    ///
    /// PostgreSQL error codes:
    /// <https://www.postgresql.org/docs/current/errcodes-appendix.html>
    pub fn from_sqlx(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::Configuration(_) => {
                DatabaseError::ConnectionFailed(error.to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                DatabaseError::Decode(error.to_string())
            }
            sqlx::Error::Database(db_error) => match db_error.code().as_deref() {
                Some("23505") => DatabaseError::DuplicateEntry(db_error.message().to_string()),
                Some("23503") => {
                    DatabaseError::ForeignKeyViolation(db_error.message().to_string())
                }
                Some("23514") => {
                    DatabaseError::ConstraintViolation(db_error.message().to_string())
                }
                _ => DatabaseError::QueryFailed(db_error.message().to_string()),
            },
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DatabaseError::DuplicateEntry(_))
    }

    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted
        )
    }
}

impl From<DatabaseError> for RepositoryError {
    fn from(error: DatabaseError) -> Self {
        match &error {
            DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted => {
                RepositoryError::Unavailable(error.to_string())
            }
            DatabaseError::Decode(_) => RepositoryError::Serialization(error.to_string()),
            _ => RepositoryError::Operation(error.to_string()),
        }
    }
}
