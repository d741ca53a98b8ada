//! Gateway configuration

use std::time::Duration;

/// Environment variable overriding the backend base URL.
pub const BASE_URL_ENV: &str = "STOCKDESK_API_URL";

/// Local development backend.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Immutable gateway configuration, fixed at construction.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: String,
    timeout: Duration,
    max_retries: u32,
}

impl ClientConfig {
    /// Configuration for the given backend, with default timeout and
    /// retry budget. A trailing slash on the URL is dropped so endpoint
    /// paths can always start with one.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Read the base URL from the environment, falling back to the local
    /// development backend.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Declared retry budget. Dispatch does not consume it today.
    /// TODO: wire into dispatch once it is decided whether retries apply
    /// to timeouts, 5xx responses, or both.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_dropped() {
        let config = ClientConfig::new("http://localhost:5000/api/");
        assert_eq!(config.base_url(), "http://localhost:5000/api");
    }

    #[test]
    fn defaults_match_deployment_values() {
        let config = ClientConfig::new(DEFAULT_BASE_URL);
        assert_eq!(config.timeout(), Duration::from_millis(10_000));
        assert_eq!(config.max_retries(), 3);
    }
}
