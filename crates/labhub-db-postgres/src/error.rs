//! Failures of the host database backend.

use labhub_storage::StorageError;
use sqlx_core::error::Error as SqlxError;

/// SQLSTATE raised when the catalog schema has not been created yet.
const UNDEFINED_TABLE: &str = "42P01";
/// SQLSTATE raised when the database refuses the credentials.
const INVALID_PASSWORD: &str = "28P01";

#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl PostgresError {
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<PostgresError> for StorageError {
    fn from(err: PostgresError) -> Self {
        match err {
            PostgresError::Database(e) => query_error(e),
            PostgresError::Migration(message) => {
                StorageError::internal(format!("catalog schema migration failed: {message}"))
            }
            PostgresError::Config { message } => StorageError::internal(message),
        }
    }
}

fn sqlstate(err: &SqlxError) -> Option<String> {
    match err {
        SqlxError::Database(db) => db.code().map(|c| c.into_owned()),
        _ => None,
    }
}

/// Sorts a sqlx failure into connection problems (nothing reached the
/// catalog) and statement problems.
pub(crate) fn query_error(err: SqlxError) -> StorageError {
    if matches!(
        err,
        SqlxError::PoolTimedOut | SqlxError::PoolClosed | SqlxError::Io(_) | SqlxError::Tls(_)
    ) {
        return StorageError::connection_error(err.to_string());
    }
    match sqlstate(&err).as_deref() {
        Some(INVALID_PASSWORD) => StorageError::connection_error(err.to_string()),
        Some(UNDEFINED_TABLE) => {
            StorageError::query_error(format!("{err} (run with storage.postgres.run_migrations = true)"))
        }
        _ => StorageError::query_error(err.to_string()),
    }
}

pub type Result<T> = std::result::Result<T, PostgresError>;
