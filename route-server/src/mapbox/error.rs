//! Mapbox client error types.

use std::fmt;

/// Errors from the Mapbox HTTP client.
#[derive(Debug)]
pub enum MapboxError {
    /// HTTP request failed (network error, timeout, etc.)
    Http(reqwest::Error),

    /// Response body was not the expected JSON / GeoJSON
    Json {
        message: String,
        body: Option<String>,
    },

    /// API returned an error status code
    ApiError { status: u16, message: String },

    /// Directions found no cycling route between the points
    NoRoute,

    /// Rate limited by the API
    RateLimited,

    /// Invalid or missing access token
    Unauthorized,
}

impl fmt::Display for MapboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapboxError::Http(e) => write!(f, "HTTP error: {e}"),
            MapboxError::Json { message, body } => {
                write!(f, "JSON parse error: {message}")?;
                if let Some(body) = body {
                    write!(f, " (body: {body})")?;
                }
                Ok(())
            }
            MapboxError::ApiError { status, message } => {
                write!(f, "API error {status}: {message}")
            }
            MapboxError::NoRoute => write!(f, "no cycling route between the points"),
            MapboxError::RateLimited => write!(f, "rate limited by Mapbox API"),
            MapboxError::Unauthorized => write!(f, "unauthorized (invalid access token)"),
        }
    }
}

impl std::error::Error for MapboxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapboxError::Http(e) => Some(e),
            _ => None,
        }
    }
}

/// The request URL carries the access token, so it is stripped from
/// transport errors before they can reach a log line or a client.
impl From<reqwest::Error> for MapboxError {
    fn from(err: reqwest::Error) -> Self {
        MapboxError::Http(err.without_url())
    }
}
