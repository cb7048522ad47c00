//! Freshness verdicts for cached and stored values.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Derived, never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FreshnessVerdict {
    pub is_fresh: bool,
    /// Whole seconds since the last update, clamped at zero for
    /// timestamps in the future.
    pub age_seconds: i64,
}

/// A value is fresh while its age is at most `window`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FreshnessPolicy {
    window: Duration,
}

impl FreshnessPolicy {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn evaluate(&self, last_updated: DateTime<Utc>, now: DateTime<Utc>) -> FreshnessVerdict {
        let age_seconds = (now - last_updated).num_seconds().max(0);
        let window = i64::try_from(self.window.as_secs()).unwrap_or(i64::MAX);
        FreshnessVerdict {
            is_fresh: age_seconds <= window,
            age_seconds,
        }
    }

    /// Same as [`evaluate`](Self::evaluate) for a unix-seconds timestamp.
    /// Out-of-range timestamps are treated as infinitely old.
    pub fn evaluate_unix(&self, last_updated: i64, now: DateTime<Utc>) -> FreshnessVerdict {
        match DateTime::<Utc>::from_timestamp(last_updated, 0) {
            Some(ts) => self.evaluate(ts, now),
            None => FreshnessVerdict {
                is_fresh: false,
                age_seconds: i64::MAX,
            },
        }
    }
}
