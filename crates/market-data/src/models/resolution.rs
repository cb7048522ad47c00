use std::fmt;

use serde::{Deserialize, Serialize};

/// Bar resolutions served natively by the provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarResolution {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    FourHours,
    Daily,
}

/// Intraday resolutions, coarsest first.
const INTRADAY_COARSEST_FIRST: [BarResolution; 6] = [
    BarResolution::FourHours,
    BarResolution::OneHour,
    BarResolution::ThirtyMinutes,
    BarResolution::FifteenMinutes,
    BarResolution::FiveMinutes,
    BarResolution::OneMinute,
];

impl BarResolution {
    /// Path segment used by the chart endpoints.
    pub fn as_api_value(&self) -> &'static str {
        match self {
            BarResolution::OneMinute => "1min",
            BarResolution::FiveMinutes => "5min",
            BarResolution::FifteenMinutes => "15min",
            BarResolution::ThirtyMinutes => "30min",
            BarResolution::OneHour => "1hour",
            BarResolution::FourHours => "4hour",
            BarResolution::Daily => "1day",
        }
    }

    pub fn minutes(&self) -> u32 {
        match self {
            BarResolution::OneMinute => 1,
            BarResolution::FiveMinutes => 5,
            BarResolution::FifteenMinutes => 15,
            BarResolution::ThirtyMinutes => 30,
            BarResolution::OneHour => 60,
            BarResolution::FourHours => 240,
            BarResolution::Daily => 1440,
        }
    }

    pub fn is_intraday(&self) -> bool {
        !matches!(self, BarResolution::Daily)
    }

    /// Coarsest intraday resolution whose bars tile an interval of
    /// `interval_minutes` exactly. One-minute bars tile everything.
    pub fn coarsest_dividing(interval_minutes: u32) -> BarResolution {
        INTRADAY_COARSEST_FIRST
            .into_iter()
            .find(|r| interval_minutes > 0 && interval_minutes % r.minutes() == 0)
            .unwrap_or(BarResolution::OneMinute)
    }
}

impl fmt::Display for BarResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_value())
    }
}
