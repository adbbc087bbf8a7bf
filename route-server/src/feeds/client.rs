//! HTTP client for both provider feeds.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::error::FeedError;
use super::types::{FeedBatch, ProviderARecord, ProviderBRecord};

/// Default URL of the provider A (PubliBike) public station list.
const DEFAULT_PROVIDER_A_URL: &str = "https://rest.publibike.ch/v1/public/stations";

const PROVIDER_A: &str = "provider A";
const PROVIDER_B: &str = "provider B";

/// Provider B publishes either a bare array or an object wrapping one.
///
/// Entries stay undecoded here so that one bad entry cannot fail the shape.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProviderBResponse {
    Bare(Vec<Value>),
    Wrapped { stations: Vec<Value> },
}

impl ProviderBResponse {
    fn into_entries(self) -> Vec<Value> {
        match self {
            ProviderBResponse::Bare(records) => records,
            ProviderBResponse::Wrapped { stations } => stations,
        }
    }
}

/// Configuration for the feed client.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Provider A station list URL
    pub provider_a_url: String,
    /// Provider B station list URL; provider B is skipped when unset
    pub provider_b_url: Option<String>,
    /// Optional API key sent to provider B as `x-apikey`
    pub provider_b_api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl FeedConfig {
    /// Create a config pointing at the public provider A feed only.
    pub fn new() -> Self {
        Self {
            provider_a_url: DEFAULT_PROVIDER_A_URL.to_string(),
            provider_b_url: None,
            provider_b_api_key: None,
            timeout_secs: 30,
        }
    }

    /// Set a custom provider A URL (for testing).
    pub fn with_provider_a_url(mut self, url: impl Into<String>) -> Self {
        self.provider_a_url = url.into();
        self
    }

    /// Enable provider B.
    pub fn with_provider_b_url(mut self, url: impl Into<String>) -> Self {
        self.provider_b_url = Some(url.into());
        self
    }

    pub fn with_provider_b_api_key(mut self, key: impl Into<String>) -> Self {
        self.provider_b_api_key = Some(key.into());
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Client for the two station provider feeds.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    provider_a_url: String,
    provider_b_url: Option<String>,
    provider_b_headers: HeaderMap,
}

impl FeedClient {
    /// Create a new feed client.
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        let mut provider_b_headers = HeaderMap::new();
        if let Some(key) = &config.provider_b_api_key {
            let value = HeaderValue::from_str(key).map_err(|_| FeedError::Api {
                provider: PROVIDER_B,
                status: 0,
                message: "Invalid API key format".to_string(),
            })?;
            provider_b_headers.insert(HeaderName::from_static("x-apikey"), value);
        }

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            provider_a_url: config.provider_a_url,
            provider_b_url: config.provider_b_url,
            provider_b_headers,
        })
    }

    /// Whether provider B is configured.
    pub fn has_provider_b(&self) -> bool {
        self.provider_b_url.is_some()
    }

    /// Fetch every provider A station.
    pub async fn fetch_provider_a(&self) -> Result<FeedBatch<ProviderARecord>, FeedError> {
        let request = self.http.get(&self.provider_a_url);
        let entries: Vec<Value> = get_json(PROVIDER_A, request).await?;
        Ok(FeedBatch::decode(PROVIDER_A, entries, "id"))
    }

    /// Fetch every provider B station.
    pub async fn fetch_provider_b(&self) -> Result<FeedBatch<ProviderBRecord>, FeedError> {
        let url = self
            .provider_b_url
            .as_ref()
            .ok_or(FeedError::NotConfigured(PROVIDER_B))?;

        let request = self
            .http
            .get(url)
            .headers(self.provider_b_headers.clone());
        let response: ProviderBResponse = get_json(PROVIDER_B, request).await?;
        Ok(FeedBatch::decode(
            PROVIDER_B,
            response.into_entries(),
            "station_id",
        ))
    }
}

/// Send a request and decode a JSON body, classifying failure statuses.
async fn get_json<T: DeserializeOwned>(
    provider: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<T, FeedError> {
    let response = request.send().await?;
    let status = response.status();

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(FeedError::Unauthorized { provider });
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FeedError::Api {
            provider,
            status: status.as_u16(),
            message: body,
        });
    }

    let body = response.text().await?;
    debug!(provider, bytes = body.len(), "fetched station feed");

    serde_json::from_str(&body).map_err(|e| FeedError::Json {
        provider,
        message: e.to_string(),
    })
}
