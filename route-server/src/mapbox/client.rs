//! Mapbox HTTP client.
//!
//! Provides async methods for the Isochrone and Directions APIs. Handles
//! authentication, bounded concurrency and decoding of responses.

use std::sync::Arc;

use geojson::{FeatureCollection, GeoJson};
use tokio::sync::Semaphore;
use tracing::debug;

use crate::domain::Point;

use super::error::MapboxError;
use super::types::{Directions, DirectionsResponse};

/// Default base URL for the Mapbox APIs.
const DEFAULT_BASE_URL: &str = "https://api.mapbox.com";

/// Default routing profile.
const DEFAULT_PROFILE: &str = "cycling";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Configuration for the Mapbox client.
#[derive(Debug, Clone)]
pub struct MapboxConfig {
    /// Access token, sent as the `access_token` query parameter
    pub access_token: String,
    /// Base URL for the API (defaults to production Mapbox)
    pub base_url: String,
    /// Routing profile (`cycling`, `walking`, ...)
    pub profile: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl MapboxConfig {
    /// Create a new config with the given access token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            profile: DEFAULT_PROFILE.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 10,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the routing profile.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Mapbox API client.
///
/// Uses a semaphore to limit concurrent requests and avoid rate limiting.
#[derive(Debug, Clone)]
pub struct MapboxClient {
    http: reqwest::Client,
    base_url: String,
    profile: String,
    access_token: String,
    semaphore: Arc<Semaphore>,
}

impl MapboxClient {
    /// Create a new Mapbox client with the given configuration.
    pub fn new(config: MapboxConfig) -> Result<Self, MapboxError> {
        if config.access_token.trim().is_empty() {
            return Err(MapboxError::Unauthorized);
        }

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
            profile: config.profile,
            access_token: config.access_token,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    /// Get isochrone polygons around `origin`, one per contour.
    ///
    /// # Arguments
    ///
    /// * `origin` - Centre of the isochrone
    /// * `contours_minutes` - Travel times to draw contours for (1 to 60, at most 4)
    pub async fn isochrone(
        &self,
        origin: Point,
        contours_minutes: &[u32],
    ) -> Result<FeatureCollection, MapboxError> {
        let url = format!(
            "{}/isochrone/v1/mapbox/{}/{}",
            self.base_url,
            self.profile,
            coordinate(origin)
        );

        let contours = contours_minutes
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let body = self
            .get_text(
                &url,
                &[
                    ("contours_minutes", contours),
                    ("polygons", "true".to_string()),
                ],
            )
            .await?;

        match body.parse::<GeoJson>() {
            Ok(GeoJson::FeatureCollection(collection)) => Ok(collection),
            Ok(_) => Err(MapboxError::Json {
                message: "expected a FeatureCollection".to_string(),
                body: Some(body.chars().take(500).collect()),
            }),
            Err(e) => Err(MapboxError::Json {
                message: e.to_string(),
                body: Some(body.chars().take(500).collect()),
            }),
        }
    }

    /// Get cycling directions for a single leg.
    pub async fn directions(
        &self,
        origin: Point,
        destination: Point,
    ) -> Result<Directions, MapboxError> {
        let url = format!(
            "{}/directions/v5/mapbox/{}/{};{}",
            self.base_url,
            self.profile,
            coordinate(origin),
            coordinate(destination)
        );

        let body = self
            .get_text(
                &url,
                &[
                    ("geometries", "geojson".to_string()),
                    ("overview", "full".to_string()),
                ],
            )
            .await?;

        let response: DirectionsResponse =
            serde_json::from_str(&body).map_err(|e| MapboxError::Json {
                message: e.to_string(),
                body: Some(body.chars().take(500).collect()),
            })?;

        if response.code == "NoRoute" {
            return Err(MapboxError::NoRoute);
        }
        if response.code != "Ok" {
            return Err(MapboxError::ApiError {
                status: 200,
                message: response.message.unwrap_or(response.code),
            });
        }

        response
            .routes
            .into_iter()
            .next()
            .map(Directions::from)
            .ok_or(MapboxError::NoRoute)
    }

    /// Issue an authenticated GET and return the body of a successful response.
    async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String, MapboxError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| MapboxError::ApiError {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        debug!(url, "mapbox request");

        let response = self
            .http
            .get(url)
            .query(query)
            .query(&[("access_token", self.access_token.as_str())])
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(MapboxError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MapboxError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MapboxError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(response.text().await?)
    }
}

/// Format a point as Mapbox expects: `lng,lat`.
fn coordinate(p: Point) -> String {
    format!("{:.6},{:.6}", p.longitude, p.latitude)
}
