//! Shared HTTP configuration for provider adapters.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;

/// Default user agent for provider requests.
pub const DEFAULT_USER_AGENT: &str = "routecompare/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Error type for adapter construction failures.
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// A credential was empty.
    #[error("{provider} requires a non-empty API key")]
    MissingApiKey {
        /// Display name of the provider.
        provider: &'static str,
    },
}

/// Connection settings for one provider endpoint.
#[derive(Debug, Clone)]
pub struct HttpProviderConfig {
    /// Endpoint URL, e.g. `"https://router.hereapi.com/v8/routes"` or an
    /// OSRM host such as `"http://localhost:5000"`.
    pub base_url: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl HttpProviderConfig {
    /// Create a new configuration with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Base URL without a trailing slash.
    pub(crate) fn trimmed_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub(crate) fn build_client(&self) -> Result<Client, ProviderBuildError> {
        Client::builder()
            .user_agent(&self.user_agent)
            .connect_timeout(self.timeout)
            .timeout(self.timeout)
            .build()
            .map_err(ProviderBuildError::HttpClient)
    }
}

/// Reject blank credentials before any request is made.
pub(crate) fn require_api_key(
    provider: &'static str,
    api_key: impl Into<String>,
) -> Result<String, ProviderBuildError> {
    let api_key = api_key.into();
    if api_key.trim().is_empty() {
        return Err(ProviderBuildError::MissingApiKey { provider });
    }
    Ok(api_key)
}
