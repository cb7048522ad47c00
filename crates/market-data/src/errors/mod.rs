//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all market data operations
//! - [`RetryClass`]: Classification for determining retry behavior
//! - [`FailureKind`]: Coarse category used when labeling stale data

mod retry;

pub use retry::{FailureKind, RetryClass};

use thiserror::Error;

/// Errors that can occur during market data operations.
///
/// Each variant is classified into a [`RetryClass`] via
/// [`retry_class`](Self::retry_class) and into a [`FailureKind`] via
/// [`failure_kind`](Self::failure_kind).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    /// The provider rate limited the request (HTTP 429).
    #[error("Rate limited: {provider}")]
    RateLimited { provider: String },

    /// The request did not complete within the configured timeout.
    #[error("Timeout: {provider}")]
    Timeout { provider: String },

    /// The request could not be sent or the connection dropped.
    #[error("Network error: {provider} - {message}")]
    Network { provider: String, message: String },

    /// The provider answered with a non-2xx status and no error envelope.
    #[error("HTTP {status} from {provider}")]
    HttpStatus { provider: String, status: u16 },

    /// The provider answered with an explicit error envelope
    /// (`{"Error Message": ..}` or `{"error": ..}`), whatever the status.
    #[error("Provider error: {provider} - {message}")]
    ProviderError { provider: String, message: String },

    /// The payload was not JSON, or lacked the identifying fields.
    #[error("Invalid payload from {provider}: {message}")]
    InvalidPayload { provider: String, message: String },

    /// The payload was well-formed but empty.
    #[error("No data: {0}")]
    NoData(String),

    /// An interval spec did not match `<digits>(h|m)`.
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// ```
    /// use tickerline_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::RateLimited { provider: "FMP".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = MarketDataError::NoData("AAPL".to_string());
    /// assert_eq!(error.retry_class(), RetryClass::NextEndpoint);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::RateLimited { .. } | Self::Timeout { .. } => RetryClass::WithBackoff,

            Self::Network { .. }
            | Self::HttpStatus { .. }
            | Self::ProviderError { .. }
            | Self::InvalidPayload { .. }
            | Self::NoData(_) => RetryClass::NextEndpoint,

            Self::InvalidInterval(_) => RetryClass::Never,
        }
    }

    /// Returns the coarse failure category for this error.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Timeout { .. } | Self::Network { .. } => FailureKind::Network,
            Self::RateLimited { .. } | Self::HttpStatus { .. } | Self::ProviderError { .. } => {
                FailureKind::Api
            }
            Self::InvalidPayload { .. } | Self::NoData(_) | Self::InvalidInterval(_) => {
                FailureKind::InvalidData
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> String {
        "FMP".to_string()
    }

    #[test]
    fn test_rate_limited_retries_with_backoff() {
        let error = MarketDataError::RateLimited {
            provider: provider(),
        };
        assert_eq!(error.retry_class(), RetryClass::WithBackoff);
        assert_eq!(error.failure_kind(), FailureKind::Api);
    }

    #[test]
    fn test_timeout_retries_with_backoff() {
        let error = MarketDataError::Timeout {
            provider: provider(),
        };
        assert_eq!(error.retry_class(), RetryClass::WithBackoff);
        assert_eq!(error.failure_kind(), FailureKind::Network);
    }

    #[test]
    fn test_error_envelope_tries_next_endpoint() {
        let error = MarketDataError::ProviderError {
            provider: provider(),
            message: "Invalid API KEY".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::NextEndpoint);
        assert_eq!(error.failure_kind(), FailureKind::Api);
    }

    #[test]
    fn test_empty_payload_tries_next_endpoint() {
        let error = MarketDataError::NoData("AAPL".to_string());
        assert_eq!(error.retry_class(), RetryClass::NextEndpoint);
        assert_eq!(error.failure_kind(), FailureKind::InvalidData);
    }

    #[test]
    fn test_connection_failure_is_network() {
        let error = MarketDataError::Network {
            provider: provider(),
            message: "connection refused".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::NextEndpoint);
        assert_eq!(error.failure_kind(), FailureKind::Network);
    }

    #[test]
    fn test_invalid_interval_never_retries() {
        let error = MarketDataError::InvalidInterval("3d".to_string());
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::HttpStatus {
            provider: provider(),
            status: 502,
        };
        assert_eq!(format!("{}", error), "HTTP 502 from FMP");

        let error = MarketDataError::ProviderError {
            provider: provider(),
            message: "Limit Reach".to_string(),
        };
        assert_eq!(format!("{}", error), "Provider error: FMP - Limit Reach");
    }
}
