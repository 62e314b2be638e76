//! # Database Error Types
//!
//! ```text
//! sqlx::Error / MigrateError / serde_json::Error
//!       │
//!       ▼
//! DbError (this module)
//!       │
//!       ▼
//! ApiError (apps/web) → 500 with a generic message, details in the log
//! ```

use thiserror::Error;

/// Local store errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Requested key does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Database file could not be opened or created.
    ///
    /// ## When This Occurs
    /// - Parent directory missing or read-only
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A blob could not be encoded or decoded as JSON.
    ///
    /// ## When This Occurs
    /// - Value hand-edited into something that is not JSON
    /// - Value written by an incompatible build
    #[error("Serialization failed for {key}: {message}")]
    Serialization { key: String, message: String },

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn serialization(key: impl Into<String>, err: serde_json::Error) -> Self {
        DbError::Serialization {
            key: key.into(),
            message: err.to_string(),
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => DbError::QueryFailed(db_err.message().to_string()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),
            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_error_names_key() {
        let json_err = serde_json::from_str::<Vec<u8>>("not json").unwrap_err();
        let err = DbError::serialization("hopline:users", json_err);
        assert!(err.to_string().starts_with("Serialization failed for hopline:users"));
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
