//! Configuration options for the API client.

use crate::api::ApiKey;
use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Default REST base URL
pub const DEFAULT_BASE_URL: &str = "https://chat.stream-io-api.com";

/// Value of the `X-Stream-Client` header sent with every request
pub const CLIENT_HEADER_VALUE: &str = concat!("chatlink-rust-client-v", env!("CARGO_PKG_VERSION"));

/// Configuration options for creating an API client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientOptions {
    /// Application API key from your chat dashboard
    pub api_key: String,

    /// REST base URL (default: `DEFAULT_BASE_URL`)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Gzip request bodies when it makes them smaller
    #[serde(default)]
    pub gzip_requests: Option<bool>,

    /// Timeout for a single HTTP exchange in milliseconds (default: 30000)
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,

    /// How long an encoder waits for a connection id before failing.
    /// Unset means the wait is bounded only by the realtime connection.
    #[serde(default)]
    pub connection_id_timeout_ms: Option<u64>,

    /// Whether the client runs a realtime connection (default: true).
    /// Without it, connection-id requests fail immediately.
    #[serde(default)]
    pub realtime_enabled: Option<bool>,

    /// Enable debug logging of requests and responses
    #[serde(default)]
    pub debug: Option<bool>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            gzip_requests: Some(false),
            request_timeout_ms: Some(30_000),
            connection_id_timeout_ms: None,
            realtime_enabled: Some(true),
            debug: Some(false),
        }
    }
}

impl ClientOptions {
    /// Create new options with just the API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Builder pattern: set REST base URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Builder pattern: enable/disable gzip request bodies
    pub fn gzip_requests(mut self, enabled: bool) -> Self {
        self.gzip_requests = Some(enabled);
        self
    }

    /// Builder pattern: set HTTP timeout
    pub fn request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = Some(timeout_ms);
        self
    }

    /// Builder pattern: bound the wait for a connection id
    pub fn connection_id_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.connection_id_timeout_ms = Some(timeout_ms);
        self
    }

    /// Builder pattern: enable/disable the realtime connection
    pub fn realtime_enabled(mut self, enabled: bool) -> Self {
        self.realtime_enabled = Some(enabled);
        self
    }

    /// Builder pattern: enable debug mode
    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = Some(enabled);
        self
    }

    /// Get request timeout duration
    pub fn get_request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.unwrap_or(30_000))
    }

    /// Get connection id timeout duration, if any
    pub fn get_connection_id_timeout(&self) -> Option<Duration> {
        self.connection_id_timeout_ms.map(Duration::from_millis)
    }

    /// Check if debug mode is enabled
    pub fn is_debug(&self) -> bool {
        self.debug.unwrap_or(false)
    }
}

/// Internal configuration derived from ClientOptions
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: ApiKey,
    pub base_url: Url,
    pub gzip_requests: bool,
    pub request_timeout: Duration,
    pub connection_id_timeout: Option<Duration>,
    pub realtime_enabled: bool,
    pub client_header: String,
    pub debug: bool,
}

impl TryFrom<ClientOptions> for Config {
    type Error = ClientError;

    fn try_from(opts: ClientOptions) -> Result<Self> {
        let api_key = ApiKey::new(opts.api_key.clone())?;
        let raw_base_url = opts
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&raw_base_url)
            .map_err(|e| ClientError::config(format!("Invalid base URL '{}': {}", raw_base_url, e)))?;

        Ok(Self {
            api_key,
            base_url,
            gzip_requests: opts.gzip_requests.unwrap_or(false),
            request_timeout: opts.get_request_timeout(),
            connection_id_timeout: opts.get_connection_id_timeout(),
            realtime_enabled: opts.realtime_enabled.unwrap_or(true),
            client_header: CLIENT_HEADER_VALUE.to_string(),
            debug: opts.is_debug(),
        })
    }
}
