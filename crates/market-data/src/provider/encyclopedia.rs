//! Encyclopedia summary lookup used to fill in missing profile descriptions.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::errors::MarketDataError;

const WIKIPEDIA_BASE_URL: &str = "https://en.wikipedia.org";
const SOURCE_ID: &str = "WIKIPEDIA";

/// A source of free-text descriptions keyed by a title (company name).
#[async_trait]
pub trait DescriptionSource: Send + Sync {
    /// Label recorded as the profile's `description_source`.
    fn id(&self) -> &'static str;

    /// `Ok(None)` when the source has no usable article for `title`.
    async fn lookup(&self, title: &str) -> Result<Option<String>, MarketDataError>;
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    extract: Option<String>,
}

/// Wikipedia REST summary client (`/api/rest_v1/page/summary/{title}`).
pub struct WikipediaSummaryClient {
    client: Client,
    base_url: String,
}

impl WikipediaSummaryClient {
    pub fn new(timeout: Duration) -> Self {
        Self::with_base_url(WIKIPEDIA_BASE_URL, timeout)
    }

    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn summary_url(&self, title: &str) -> String {
        let slug = title.trim().replace(' ', "_");
        format!(
            "{}/api/rest_v1/page/summary/{}",
            self.base_url,
            urlencoding::encode(&slug)
        )
    }
}

#[async_trait]
impl DescriptionSource for WikipediaSummaryClient {
    fn id(&self) -> &'static str {
        SOURCE_ID
    }

    async fn lookup(&self, title: &str) -> Result<Option<String>, MarketDataError> {
        if title.trim().is_empty() {
            return Ok(None);
        }

        let url = self.summary_url(title);
        debug!("Wikipedia summary request: {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                MarketDataError::Timeout {
                    provider: SOURCE_ID.to_string(),
                }
            } else {
                MarketDataError::Network {
                    provider: SOURCE_ID.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(MarketDataError::HttpStatus {
                provider: SOURCE_ID.to_string(),
                status: status.as_u16(),
            });
        }

        let summary: SummaryResponse =
            response
                .json()
                .await
                .map_err(|e| MarketDataError::InvalidPayload {
                    provider: SOURCE_ID.to_string(),
                    message: e.to_string(),
                })?;

        if summary.kind.as_deref() == Some("disambiguation") {
            return Ok(None);
        }

        Ok(summary
            .extract
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty()))
    }
}
