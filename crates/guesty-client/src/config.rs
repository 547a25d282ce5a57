//! Configuration types for guesty-client.

use std::env;
use std::time::Duration;

/// Default Guesty Open API base URL.
pub const DEFAULT_BASE_URL: &str = "https://open-api.guesty.com/v1";

/// Default OAuth2 token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://open-api.guesty.com/oauth2/token";

/// Retry budget for transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles with every further retry.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Backoff delay before retry number `attempt` (0-based): `base * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .checked_mul(2u32.saturating_pow(attempt))
            .unwrap_or(Duration::MAX)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Configuration for connecting to the Guesty Open API.
#[derive(Debug, Clone)]
pub struct GuestyConfig {
    /// Base URL of the API (e.g., "https://open-api.guesty.com/v1").
    pub base_url: String,
    /// OAuth2 client-credentials token endpoint.
    pub token_url: String,
    /// OAuth2 client id.
    pub client_id: String,
    /// OAuth2 client secret.
    pub client_secret: String,
    /// Retry budget for 401/429/5xx handling.
    pub retry: RetryPolicy,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for GuestyConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl GuestyConfig {
    /// Create configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `GUESTY_BASE_URL` | `https://open-api.guesty.com/v1` |
    /// | `GUESTY_TOKEN_URL` | `https://open-api.guesty.com/oauth2/token` |
    /// | `GUESTY_CLIENT_ID` | empty |
    /// | `GUESTY_CLIENT_SECRET` | empty |
    ///
    /// Missing credentials are not an error here; the first token request
    /// fails with [`GuestyError::Auth`](crate::GuestyError::Auth) instead.
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("GUESTY_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            token_url: env::var("GUESTY_TOKEN_URL")
                .unwrap_or_else(|_| DEFAULT_TOKEN_URL.to_string()),
            client_id: env::var("GUESTY_CLIENT_ID").unwrap_or_default(),
            client_secret: env::var("GUESTY_CLIENT_SECRET").unwrap_or_default(),
            ..Self::default()
        }
    }

    /// Create a new config builder.
    pub fn builder() -> GuestyConfigBuilder {
        GuestyConfigBuilder::default()
    }

    /// Full URL for an API path such as `/listings`.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Builder for GuestyConfig.
#[derive(Debug, Default)]
pub struct GuestyConfigBuilder {
    config: GuestyConfig,
}

impl GuestyConfigBuilder {
    /// Set the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the token endpoint URL.
    pub fn token_url(mut self, url: impl Into<String>) -> Self {
        self.config.token_url = url.into();
        self
    }

    /// Set the client credentials.
    pub fn credentials(mut self, client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        self.config.client_id = client_id.into();
        self.config.client_secret = client_secret.into();
        self
    }

    /// Set the retry policy.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> GuestyConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GuestyConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.token_url, DEFAULT_TOKEN_URL);
        assert!(config.client_id.is_empty());
        assert_eq!(config.retry.max_retries, 3);
    }

    #[test]
    fn test_endpoint_url() {
        let config = GuestyConfig::builder()
            .base_url("http://localhost:9000/v1/")
            .build();
        assert_eq!(config.endpoint_url("/listings"), "http://localhost:9000/v1/listings");
    }

    #[test]
    fn test_backoff_delays_double() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    }

    #[test]
    fn test_builder_all_options() {
        let retry = RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_millis(10),
        };
        let config = GuestyConfig::builder()
            .base_url("http://api")
            .token_url("http://token")
            .credentials("id", "secret")
            .retry(retry)
            .timeout(Duration::from_secs(5))
            .build();

        assert_eq!(config.base_url, "http://api");
        assert_eq!(config.token_url, "http://token");
        assert_eq!(config.client_id, "id");
        assert_eq!(config.client_secret, "secret");
        assert_eq!(config.retry, retry);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
