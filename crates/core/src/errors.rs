//! Core error types for Tickerline.
//!
//! Storage-specific errors (Diesel, SQLite, r2d2) are converted into
//! [`StoreError`] by the storage layer so this crate stays database-agnostic.

use chrono::NaiveDate;
use thiserror::Error;

/// Type alias for Result using the resolver error type.
pub type Result<T> = std::result::Result<T, ResolverError>;

/// Errors surfaced by the resolver.
///
/// Provider and store failures never appear here; they degrade to stale
/// data, an empty series, or one of the explicit "no data" variants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolverError {
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Simulated outage and nothing stored for the symbol.
    #[error("No stored data for {0}")]
    NotFound(String),

    /// Provider failed and nothing stored for the symbol.
    #[error("No data available for {0}")]
    NoDataAvailable(String),
}

/// Input validation errors, raised before any I/O.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid symbol: '{0}'")]
    InvalidSymbol(String),

    #[error("Invalid interval: '{0}' (expected <n>h or <n>m)")]
    InvalidInterval(String),

    #[error("days must be between {min} and {max}, got {days}")]
    DaysOutOfRange { days: i64, min: i64, max: i64 },

    #[error("from ({from}) is after to ({to})")]
    InvalidDateRange { from: NaiveDate, to: NaiveDate },
}

/// Database-agnostic error type for store operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Database query failed: {0}")]
    Database(String),

    #[error("Failed to get pooled connection: {0}")]
    Pool(String),

    #[error("Database migration failed: {0}")]
    Migration(String),

    #[error("Failed to (de)serialize stored value: {0}")]
    Serialization(String),

    #[error("Database writer is not running")]
    WriterClosed,
}

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Missing configuration key: {0}")]
    MissingKey(String),
}
