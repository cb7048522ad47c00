//! Ordered endpoint fallthrough.
//!
//! A logical request (quote, bars, profile) is served by several URL shapes
//! across API versions. [`first_valid`] walks them in order and stops at the
//! first one whose payload the extractor accepts.

use std::future::Future;

use log::debug;
use serde_json::Value;

use crate::errors::{MarketDataError, RetryClass};

/// One URL variant for a logical request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    /// Short name used in logs, e.g. `"stable/quote"`.
    pub label: &'static str,
    /// Path relative to the provider base URL, already percent-encoded.
    pub path: String,
    pub query: Vec<(&'static str, String)>,
}

impl Endpoint {
    pub fn new(label: &'static str, path: impl Into<String>) -> Self {
        Self {
            label,
            path: path.into(),
            query: Vec::new(),
        }
    }

    pub fn with_query(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }
}

/// Message carried by an `{"Error Message": ..}` or `{"error": ..}` body.
pub fn error_envelope(payload: &Value) -> Option<String> {
    let object = payload.as_object()?;
    ["Error Message", "error"].iter().find_map(|key| match object.get(*key)? {
        Value::Null => None,
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    })
}

/// Try `endpoints` in order and return the first extracted value.
///
/// `fetch` performs the request (including its own retries). `extract`
/// validates and converts the payload; an `Err` from it marks the endpoint
/// as unusable. Error envelopes are rejected before `extract` runs.
///
/// Failures classified [`RetryClass::NextEndpoint`] move on to the next
/// variant. When every variant fails, the error returned is `NoData` only if
/// no variant failed any other way. Anything else (an exhausted rate limit, a timeout) aborts the
/// chain, since the next variant would hit the same wall.
pub async fn first_valid<T, F, Fut, X>(
    provider: &str,
    endpoints: Vec<Endpoint>,
    fetch: F,
    extract: X,
) -> Result<T, MarketDataError>
where
    F: Fn(Endpoint) -> Fut,
    Fut: Future<Output = Result<Value, MarketDataError>>,
    X: Fn(&Value) -> Result<T, MarketDataError>,
{
    let mut last_error = None;

    for endpoint in endpoints {
        let label = endpoint.label;
        let attempt = fetch(endpoint).await.and_then(|payload| {
            if let Some(message) = error_envelope(&payload) {
                return Err(MarketDataError::ProviderError {
                    provider: provider.to_string(),
                    message,
                });
            }
            extract(&payload)
        });

        match attempt {
            Ok(value) => {
                debug!("{} endpoint {} answered", provider, label);
                return Ok(value);
            }
            Err(err) if err.retry_class() == RetryClass::NextEndpoint => {
                debug!("{} endpoint {} unusable: {}", provider, label, err);
                // An empty answer from a later variant never masks an earlier rejection.
                last_error = match last_error {
                    Some(previous) if matches!(err, MarketDataError::NoData(_)) => Some(previous),
                    _ => Some(err),
                };
            }
            Err(err) => return Err(err),
        }
    }

    Err(last_error.unwrap_or_else(|| {
        MarketDataError::NoData(format!("{}: no endpoint variants configured", provider))
    }))
}
