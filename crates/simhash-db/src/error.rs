//! Database error types.

use simhash_core::SimhashError;
use thiserror::Error;

/// Database operation errors.
#[derive(Error, Debug)]
pub enum DbError {
    /// Invalid configuration or identifier.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    TransactionError(String),

    /// SQLx error.
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),
}

/// Convert a DbError into a SimhashError::Storage.
pub(crate) fn db_err(e: DbError) -> SimhashError {
    SimhashError::Storage(e.to_string())
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_err_is_storage() {
        let err = db_err(DbError::TransactionError("commit failed".into()));
        assert!(err.is_storage());
        assert_eq!(err.to_string(), "Storage error: Transaction error: commit failed");

        let err = db_err(DbError::from(sqlx::Error::PoolClosed));
        assert!(err.is_storage());
    }
}
