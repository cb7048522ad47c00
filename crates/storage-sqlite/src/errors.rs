//! Storage-specific error types for SQLite operations.
//!
//! Diesel and r2d2 errors stay inside this crate; they are converted to the
//! database-agnostic [`StoreError`] at the repository boundary.

use diesel::result::Error as DieselError;
use thiserror::Error;
use tickerline_core::StoreError;

/// Storage-specific errors that wrap Diesel and r2d2 types.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(#[from] diesel::ConnectionError),

    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error("Query execution failed: {0}")]
    QueryFailed(#[from] DieselError),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database writer is not running")]
    WriterClosed,

    #[error("Internal storage error: {0}")]
    Internal(String),
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ConnectionFailed(e) => StoreError::Pool(e.to_string()),
            StorageError::PoolError(e) => StoreError::Pool(e.to_string()),
            StorageError::QueryFailed(e) => StoreError::Database(e.to_string()),
            StorageError::MigrationFailed(e) => StoreError::Migration(e),
            StorageError::SerializationError(e) => StoreError::Serialization(e),
            StorageError::Io(e) => StoreError::Database(e.to_string()),
            StorageError::WriterClosed => StoreError::WriterClosed,
            StorageError::Internal(e) => StoreError::Database(e),
        }
    }
}

/// Extension trait for converting storage results at the repository boundary.
pub trait IntoStore<T> {
    fn into_store(self) -> Result<T, StoreError>;
}

impl<T, E> IntoStore<T> for Result<T, E>
where
    E: Into<StorageError>,
{
    fn into_store(self) -> Result<T, StoreError> {
        self.map_err(|e| StoreError::from(e.into()))
    }
}
