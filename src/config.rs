//! Configuration and credentials for the feed client.
//!
//! This module provides the [`Config`] struct for the websocket endpoint,
//! optional API credentials, and client settings.

use std::time::Duration;

/// Production websocket endpoint
pub const DEFAULT_ENDPOINT: &str = "wss://ftx.com/ws/";

/// Configuration for the feed client
///
/// Credentials are only required for authenticated channels; the order
/// book feed is public.
///
/// # Example
///
/// ```rust
/// use ftx_feed::Config;
///
/// let config = Config::new();
///
/// // Authenticated session with a custom wait timeout
/// let config = Config::new()
///     .with_credentials("api-key", "api-secret")
///     .with_wait_timeout(std::time::Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// WebSocket endpoint URL
    endpoint: String,

    /// API key (for the `login` op)
    api_key: Option<String>,

    /// API secret (HMAC signing key)
    api_secret: Option<String>,

    /// Default timeout for blocking waits on book freshness
    wait_timeout: Duration,
}

impl Config {
    /// Create a configuration pointing at the production endpoint
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            api_secret: None,
            wait_timeout: Duration::from_secs(5),
        }
    }

    /// Override the websocket endpoint (e.g. for a test server)
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set API credentials for authenticated channels
    #[must_use]
    pub fn with_credentials(
        mut self,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        self.api_key = Some(api_key.into());
        self.api_secret = Some(api_secret.into());
        self
    }

    /// Set the default timeout used when waiting for the first book image
    #[must_use]
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Get the websocket endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Get the API key, if configured
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Get the API secret, if configured
    pub fn api_secret(&self) -> Option<&str> {
        self.api_secret.as_deref()
    }

    /// Whether both credentials are present
    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some() && self.api_secret.is_some()
    }

    /// Get the default wait timeout
    pub fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
