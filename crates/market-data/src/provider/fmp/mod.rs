//! Financial Modeling Prep style market data provider.
//!
//! Every logical request has several URL shapes (the `stable` API and the
//! older `v3`/`v4` paths). They are tried in order through [`first_valid`];
//! each single request is retried with backoff on 429 and timeouts.
//!
//! API documentation: https://site.financialmodelingprep.com/developer/docs

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::errors::MarketDataError;
use crate::models::{AssetProfile, BarResolution, ProviderQuote, RawBar};
use crate::provider::encyclopedia::DescriptionSource;
use crate::provider::normalize::{normalize_bars, normalize_profile, normalize_quote};
use crate::provider::{error_envelope, first_valid, Endpoint, MarketDataProvider, ProviderSettings};

const PROVIDER_ID: &str = "FMP";

/// FMP market data provider.
pub struct FmpProvider {
    client: Client,
    settings: ProviderSettings,
    descriptions: Option<Arc<dyn DescriptionSource>>,
}

impl FmpProvider {
    pub fn new(settings: ProviderSettings) -> Self {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            settings,
            descriptions: None,
        }
    }

    /// Fill missing profile descriptions from `source`.
    pub fn with_description_source(mut self, source: Arc<dyn DescriptionSource>) -> Self {
        self.descriptions = Some(source);
        self
    }

    fn url(&self, endpoint: &Endpoint) -> String {
        format!(
            "{}{}",
            self.settings.base_url.trim_end_matches('/'),
            endpoint.path
        )
    }

    /// One GET, no retries.
    async fn request(&self, endpoint: &Endpoint) -> Result<Value, MarketDataError> {
        let url = self.url(endpoint);
        debug!("FMP request: {} ({} params)", endpoint.label, endpoint.query.len());

        let response = self
            .client
            .get(&url)
            .query(&endpoint.query)
            .query(&[("apikey", self.settings.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MarketDataError::Timeout {
                        provider: PROVIDER_ID.to_string(),
                    }
                } else {
                    MarketDataError::Network {
                        provider: PROVIDER_ID.to_string(),
                        message: format!("Request failed: {}", e),
                    }
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                MarketDataError::Timeout {
                    provider: PROVIDER_ID.to_string(),
                }
            } else {
                MarketDataError::Network {
                    provider: PROVIDER_ID.to_string(),
                    message: format!("Failed to read response: {}", e),
                }
            }
        })?;

        if !status.is_success() {
            if let Some(message) = serde_json::from_str::<Value>(&body)
                .ok()
                .as_ref()
                .and_then(error_envelope)
            {
                return Err(MarketDataError::ProviderError {
                    provider: PROVIDER_ID.to_string(),
                    message,
                });
            }
            return Err(MarketDataError::HttpStatus {
                provider: PROVIDER_ID.to_string(),
                status: status.as_u16(),
            });
        }

        serde_json::from_str(&body).map_err(|e| MarketDataError::InvalidPayload {
            provider: PROVIDER_ID.to_string(),
            message: format!("Failed to parse response: {}", e),
        })
    }

    /// GET with the configured retry policy.
    async fn get_json(&self, endpoint: Endpoint) -> Result<Value, MarketDataError> {
        self.settings
            .retry
            .run(endpoint.label, || self.request(&endpoint))
            .await
    }

    fn quote_endpoints(symbol: &str) -> Vec<Endpoint> {
        let encoded = urlencoding::encode(symbol);
        vec![
            Endpoint::new("stable/quote", "/stable/quote").with_query("symbol", symbol),
            Endpoint::new("v3/quote", format!("/api/v3/quote/{}", encoded)),
            Endpoint::new("v3/quote-short", format!("/api/v3/quote-short/{}", encoded)),
        ]
    }

    fn bar_endpoints(
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
        resolution: BarResolution,
    ) -> Vec<Endpoint> {
        let encoded = urlencoding::encode(symbol);
        let from = from.format("%Y-%m-%d").to_string();
        let to = to.format("%Y-%m-%d").to_string();

        let endpoints = if resolution.is_intraday() {
            let res = resolution.as_api_value();
            vec![
                Endpoint::new("stable/historical-chart", format!("/stable/historical-chart/{}", res))
                    .with_query("symbol", symbol),
                Endpoint::new(
                    "v3/historical-chart",
                    format!("/api/v3/historical-chart/{}/{}", res, encoded),
                ),
            ]
        } else {
            vec![
                Endpoint::new("stable/historical-price-eod", "/stable/historical-price-eod/full")
                    .with_query("symbol", symbol),
                Endpoint::new(
                    "v3/historical-price-full",
                    format!("/api/v3/historical-price-full/{}", encoded),
                ),
            ]
        };

        endpoints
            .into_iter()
            .map(|e| e.with_query("from", from.clone()).with_query("to", to.clone()))
            .collect()
    }

    fn profile_endpoints(symbol: &str) -> Vec<Endpoint> {
        let encoded = urlencoding::encode(symbol);
        vec![
            Endpoint::new("stable/profile", "/stable/profile").with_query("symbol", symbol),
            Endpoint::new("v3/profile", format!("/api/v3/profile/{}", encoded)),
            Endpoint::new("v4/company-outlook", "/api/v4/company-outlook").with_query("symbol", symbol),
            Endpoint::new("v3/company/profile", format!("/api/v3/company/profile/{}", encoded)),
        ]
    }

    /// Best-effort description fill. Lookup failures leave the profile as is.
    async fn enrich_description(&self, profile: AssetProfile) -> AssetProfile {
        if profile.has_description() {
            return profile;
        }
        let Some(source) = &self.descriptions else {
            return profile;
        };

        let title = profile.name.clone().unwrap_or_else(|| profile.symbol.clone());
        match source.lookup(&title).await {
            Ok(Some(text)) => {
                debug!("Filled description for {} from {}", profile.symbol, source.id());
                profile.with_description(text, source.id())
            }
            Ok(None) => profile,
            Err(e) => {
                warn!("Description lookup for {} failed: {}", profile.symbol, e);
                profile
            }
        }
    }
}

#[async_trait]
impl MarketDataProvider for FmpProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<ProviderQuote, MarketDataError> {
        let fetched_at = Utc::now().timestamp();
        first_valid(
            PROVIDER_ID,
            Self::quote_endpoints(symbol),
            |endpoint| self.get_json(endpoint),
            |payload| normalize_quote(PROVIDER_ID, payload, fetched_at),
        )
        .await
    }

    async fn fetch_bars(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
        resolution: BarResolution,
    ) -> Result<Vec<RawBar>, MarketDataError> {
        let result = first_valid(
            PROVIDER_ID,
            Self::bar_endpoints(symbol, from, to, resolution),
            |endpoint| self.get_json(endpoint),
            |payload| normalize_bars(PROVIDER_ID, payload),
        )
        .await;

        let bars = match result {
            Ok(bars) => bars,
            // Only reached when every endpoint answered with an empty series.
            Err(MarketDataError::NoData(_)) => {
                info!("FMP has no {} bars for {} {}..{}", resolution, symbol, from, to);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        Ok(bars
            .into_iter()
            .filter(|bar| {
                let day = bar.timestamp.date_naive();
                day >= from && day <= to
            })
            .collect())
    }

    async fn fetch_profile(&self, symbol: &str) -> Result<AssetProfile, MarketDataError> {
        let profile = first_valid(
            PROVIDER_ID,
            Self::profile_endpoints(symbol),
            |endpoint| self.get_json(endpoint),
            |payload| normalize_profile(PROVIDER_ID, symbol, payload),
        )
        .await?;

        Ok(self.enrich_description(profile).await)
    }
}
