//! Client configuration applied at construction.

use crate::http::Header;

/// Timeout installed on every new client, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// `User-Agent` sent unless configured otherwise.
pub const DEFAULT_USER_AGENT: &str = concat!("curlish/", env!("CARGO_PKG_VERSION"));

/// Settings a `Client` starts with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Transport-level ceiling on each blocking call, in seconds. `0` disables it.
    pub timeout_secs: u64,
    /// Sent as `User-Agent` unless a request carries its own.
    pub user_agent: Option<String>,
    /// Merged into every POST-family request.
    pub default_headers: Vec<Header>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
            default_headers: Vec::new(),
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for `ClientConfig`.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Add a header merged into every POST-family request.
    pub fn default_header(mut self, header: impl Into<Header>) -> Self {
        self.config.default_headers.push(header.into());
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
