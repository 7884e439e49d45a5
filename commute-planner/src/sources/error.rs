//! Time source error types.

/// Errors from routing, geocoding and transit sources.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// Source returned an error status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Rate limited by the source
    #[error("rate limited by {0}")]
    RateLimited(&'static str),

    /// Invalid API key or unauthorized
    #[error("unauthorized (invalid API key)")]
    Unauthorized,

    /// The routing source found no route between the two points
    #[error("no route found")]
    NoRoute,

    /// A free-text address did not resolve to a location
    #[error("no location found for address: {0}")]
    UnresolvedAddress(String),
}
