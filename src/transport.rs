//! HTTP transport for live fetches
//!
//! The resolver only needs "GET this URL and give me its JSON body", so that
//! is the whole trait. `HttpTransport` implements it with reqwest.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::FetchError;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("marketdash/", env!("CARGO_PKG_VERSION"));

/// Performs live requests for the resolver
#[async_trait]
pub trait Transport: Send + Sync {
    /// GETs `url` and parses the body as JSON
    ///
    /// # Returns
    /// * `Err(FetchError::Transport)` if the request could not be completed
    /// * `Err(FetchError::BadStatus)` for non-2xx responses
    /// * `Err(FetchError::Parse)` if the body is not JSON
    async fn get_json(&self, url: &str) -> Result<Value, FetchError>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Create a transport with a custom HTTP client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let text = response.text().await?;
        let body = serde_json::from_str(&text)?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_names_crate() {
        assert!(USER_AGENT.starts_with("marketdash/"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let transport = HttpTransport::new(Duration::from_secs(2)).unwrap();
        // Port 9 (discard) on localhost is closed on any sane test machine
        let result = transport.get_json("http://127.0.0.1:9/global").await;
        assert!(matches!(result, Err(FetchError::Transport(_))));
    }

    #[tokio::test]
    async fn test_invalid_url_is_transport_error() {
        let transport = HttpTransport::with_client(Client::new());
        let result = transport.get_json("not a url").await;
        assert!(matches!(result, Err(FetchError::Transport(_))));
    }
}
