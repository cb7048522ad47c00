//! Runtime configuration loaded from the environment.

use std::str::FromStr;
use std::time::Duration;

use log::debug;

use crate::errors::ConfigError;

pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://financialmodelingprep.com";
pub const DEFAULT_DB_PATH: &str = "./db/tickerline.db";

/// Feature switches.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Skip the provider entirely and serve stored rows as stale.
    pub simulate_provider_failure: bool,
}

/// Upstream provider connection settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_PROVIDER_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Freshness window for cached and stored quotes.
    pub polling_interval: Duration,
    /// Added to the polling interval to form the cache TTL.
    pub cache_grace: Duration,
    pub feature_flags: FeatureFlags,
    pub provider: ProviderConfig,
    pub db_path: String,
}

impl ResolverConfig {
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            polling_interval: Duration::from_secs(60),
            cache_grace: Duration::from_secs(5),
            feature_flags: FeatureFlags::default(),
            provider,
            db_path: DEFAULT_DB_PATH.to_string(),
        }
    }

    /// TTL written with each cached quote.
    pub fn cache_ttl(&self) -> Duration {
        self.polling_interval + self.cache_grace
    }

    /// Load from process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("TICKERLINE_PROVIDER_API_KEY")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingKey("TICKERLINE_PROVIDER_API_KEY".to_string()))?;

        let mut provider = ProviderConfig::new(api_key);
        if let Some(base_url) = lookup("TICKERLINE_PROVIDER_BASE_URL").filter(|v| !v.trim().is_empty()) {
            provider.base_url = base_url.trim().to_string();
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "TICKERLINE_PROVIDER_TIMEOUT_SEC")? {
            provider.timeout = Duration::from_secs(secs);
        }
        if let Some(attempts) = parse_var::<u32, _>(&lookup, "TICKERLINE_PROVIDER_MAX_ATTEMPTS")? {
            if attempts == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "TICKERLINE_PROVIDER_MAX_ATTEMPTS".to_string(),
                    value: "0".to_string(),
                });
            }
            provider.max_attempts = attempts;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "TICKERLINE_PROVIDER_BASE_DELAY_MS")? {
            provider.base_delay = Duration::from_millis(ms);
        }

        let mut config = ResolverConfig::new(provider);
        if let Some(secs) = parse_var::<u64, _>(&lookup, "TICKERLINE_POLLING_INTERVAL_SEC")? {
            config.polling_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "TICKERLINE_CACHE_GRACE_SEC")? {
            config.cache_grace = Duration::from_secs(secs);
        }
        if let Some(flag) = lookup("TICKERLINE_SIMULATE_PROVIDER_FAILURE") {
            config.feature_flags.simulate_provider_failure =
                parse_bool("TICKERLINE_SIMULATE_PROVIDER_FAILURE", &flag)?;
        }
        if let Some(path) = lookup("TICKERLINE_DB_PATH").filter(|v| !v.trim().is_empty()) {
            config.db_path = path;
        }

        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}
