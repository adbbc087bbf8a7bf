//! Provider feed error types.

/// Errors that can occur when fetching a provider feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected our credentials
    #[error("unauthorized by {provider} feed")]
    Unauthorized { provider: &'static str },

    /// Provider returned an error status
    #[error("{provider} feed error {status}: {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    /// Failed to parse response JSON
    #[error("JSON parse error in {provider} feed: {message}")]
    Json {
        provider: &'static str,
        message: String,
    },

    /// Feed is not configured
    #[error("{0} feed is not configured")]
    NotConfigured(&'static str),
}
