//! Error types for the API clients.

/// Errors that can occur when calling an upstream API.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The HTTP request could not be built or sent, or the body could not be read.
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The upstream answered with HTTP 429; callers must stop issuing requests.
    #[error("Rate limited by upstream (HTTP 429)")]
    RateLimited,
    /// The API returned a non-success status with a body snippet.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// The body parsed as JSON but not in the envelope this client expects.
    #[error("Unexpected response shape: {0}")]
    UnexpectedShape(String),
    /// The body was not valid JSON for the requested type.
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Error {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited)
    }
}
