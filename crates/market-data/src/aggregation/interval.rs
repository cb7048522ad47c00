use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::MarketDataError;

lazy_static! {
    static ref INTERVAL_PATTERN: Regex = Regex::new(r"^(\d+)([hm])$").unwrap();
}

/// A fixed-width bucket size parsed from specs like `"30m"` or `"4h"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IntervalSpec {
    minutes: u32,
}

impl IntervalSpec {
    pub fn from_minutes(minutes: u32) -> Result<Self, MarketDataError> {
        if minutes == 0 {
            return Err(MarketDataError::InvalidInterval("0m".to_string()));
        }
        Ok(Self { minutes })
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn millis(&self) -> i64 {
        i64::from(self.minutes) * 60_000
    }
}

impl FromStr for IntervalSpec {
    type Err = MarketDataError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let invalid = || MarketDataError::InvalidInterval(spec.to_string());

        let caps = INTERVAL_PATTERN.captures(spec).ok_or_else(invalid)?;
        let count: u32 = caps[1].parse().map_err(|_| invalid())?;
        let minutes = match &caps[2] {
            "h" => count.checked_mul(60).ok_or_else(invalid)?,
            _ => count,
        };

        if minutes == 0 {
            return Err(invalid());
        }
        Ok(Self { minutes })
    }
}

impl fmt::Display for IntervalSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.minutes % 60 == 0 {
            write!(f, "{}h", self.minutes / 60)
        } else {
            write!(f, "{}m", self.minutes)
        }
    }
}
