//! Error types shared by the cache store, transport and resolver

use thiserror::Error;

/// Errors that can occur while fetching market data
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read
    #[error("Fetch failed: {0}")]
    Transport(String),

    /// The server answered with a non-success status code
    #[error("Bad response from {url}: HTTP {status}")]
    BadStatus { status: u16, url: String },

    /// The body was not valid JSON or did not match the provider schema
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The provider answered but reported a failure in the body
    #[error("Provider rejected request: {0}")]
    Rejected(String),

    /// Every source in a query failed or returned empty data
    #[error("All sources failed or returned empty data")]
    Exhausted,
}

impl FetchError {
    /// Returns true for errors raised before a response body was obtained
    pub fn is_network(&self) -> bool {
        matches!(self, FetchError::Transport(_) | FetchError::BadStatus { .. })
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Parse(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}
