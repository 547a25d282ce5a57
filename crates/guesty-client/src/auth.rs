//! OAuth2 client-credentials token management.

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{GuestyError, Result};

/// Tokens are refreshed once they are this close to expiry.
pub const REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: i64 = 86_400;

/// OAuth2 token response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

/// A bearer token and the instant it stops being accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Token issued at `issued_at` that lives `expires_in_secs`.
    pub fn issued(access_token: impl Into<String>, issued_at: DateTime<Utc>, expires_in_secs: i64) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: issued_at + Duration::seconds(expires_in_secs),
        }
    }

    /// Returns true while `now` is more than `margin` before expiry.
    pub fn is_valid_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        now < self.expires_at - margin
    }
}

/// Acquires and caches the bearer token shared by every request.
///
/// Cloned clients share one manager, so a refresh triggered by any call is
/// seen by all later calls.
#[derive(Debug)]
pub struct TokenManager {
    http: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    cached: RwLock<Option<CachedToken>>,
    margin: Duration,
}

impl TokenManager {
    /// Create a token manager for the given token endpoint and credentials.
    pub fn new(
        http: Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            cached: RwLock::new(None),
            margin: Duration::seconds(REFRESH_MARGIN_SECS),
        }
    }

    /// Get a valid bearer token, performing a grant when the cache is stale.
    pub async fn get_token(&self) -> Result<String> {
        {
            let cache = self.cached.read().await;
            if let Some(ref token) = *cache {
                if token.is_valid_at(Utc::now(), self.margin) {
                    debug!("Using cached Guesty token");
                    return Ok(token.access_token.clone());
                }
            }
        }

        let token = self.acquire_token().await?;
        let access_token = token.access_token.clone();
        *self.cached.write().await = Some(token);

        Ok(access_token)
    }

    /// Drop the cached token so the next call re-acquires one.
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }

    /// Snapshot of the cached token, if any.
    pub async fn cached_token(&self) -> Option<CachedToken> {
        self.cached.read().await.clone()
    }

    async fn acquire_token(&self) -> Result<CachedToken> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(GuestyError::Auth("Guesty credentials are missing".to_string()));
        }

        info!("Fetching new Guesty access token");

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", "open-api"),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| GuestyError::Auth(format!("Token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GuestyError::Auth(format!(
                "Token request failed with status {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GuestyError::Auth(format!("Failed to parse token response: {}", e)))?;

        let cached = CachedToken::issued(
            token.access_token,
            Utc::now(),
            token.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS),
        );
        debug!("Acquired Guesty token, expires at {}", cached.expires_at);

        Ok(cached)
    }
}
