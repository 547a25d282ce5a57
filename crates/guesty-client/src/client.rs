//! Guesty Open API HTTP client.

use std::sync::Arc;

use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::auth::TokenManager;
use crate::config::GuestyConfig;
use crate::error::{GuestyError, Result};
use crate::pagination::{fallback_candidates, PaginationFallback, QueryParams};

/// Authenticated client for the Guesty Open API.
///
/// Owns the retry/backoff policy and pagination-fallback negotiation. Clones
/// share the HTTP connection pool and the [`TokenManager`].
#[derive(Clone)]
pub struct GuestyClient {
    http: Client,
    config: GuestyConfig,
    tokens: Arc<TokenManager>,
}

impl GuestyClient {
    /// Create a client from configuration.
    pub fn new(config: GuestyConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GuestyError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let tokens = Arc::new(TokenManager::new(
            http.clone(),
            config.token_url.clone(),
            config.client_id.clone(),
            config.client_secret.clone(),
        ));

        Ok(Self {
            http,
            config,
            tokens,
        })
    }

    /// Create a client from environment variables.
    ///
    /// See [`GuestyConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        Self::new(GuestyConfig::from_env())
    }

    /// Get the configuration.
    pub fn config(&self) -> &GuestyConfig {
        &self.config
    }

    /// Get the shared token manager.
    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// Perform an authenticated request and return the parsed JSON body.
    ///
    /// When a request carrying `skip` is rejected with "skip ... not allowed",
    /// the alternative pagination idioms are tried in order and the first
    /// accepted response is returned. If every alternative fails, the last
    /// observed error is returned.
    pub async fn request(&self, method: Method, path: &str, params: &QueryParams) -> Result<Value> {
        let (body, _) = self.request_negotiated(method, path, params).await?;
        Ok(body)
    }

    /// Like [`request`](Self::request), but also reports which pagination
    /// fallback was accepted. `None` means the parameters were sent as given.
    pub async fn request_negotiated(
        &self,
        method: Method,
        path: &str,
        params: &QueryParams,
    ) -> Result<(Value, Option<PaginationFallback>)> {
        match self.direct().request(method.clone(), path, params).await {
            Ok(body) => Ok((body, None)),
            Err(err) if params.contains("skip") && err.is_skip_rejection() => {
                warn!("{} rejected skip pagination, negotiating fallback", path);
                let (body, fallback) = self.negotiate_pagination(method, path, params, err).await?;
                Ok((body, Some(fallback)))
            }
            Err(err) => Err(err),
        }
    }

    /// GET convenience wrapper around [`request`](Self::request).
    pub async fn get(&self, path: &str, params: &QueryParams) -> Result<Value> {
        self.request(Method::GET, path, params).await
    }

    /// Request handle with retry but without pagination fallback.
    pub fn direct(&self) -> DirectRequest<'_> {
        DirectRequest { client: self }
    }

    async fn negotiate_pagination(
        &self,
        method: Method,
        path: &str,
        params: &QueryParams,
        rejection: GuestyError,
    ) -> Result<(Value, PaginationFallback)> {
        let direct = self.direct();
        let mut last_error = rejection;

        for (fallback, candidate) in fallback_candidates(params) {
            debug!("Trying {} pagination for {}", fallback, path);
            match direct.request(method.clone(), path, &candidate).await {
                Ok(body) => {
                    info!("{} accepted {} pagination", path, fallback);
                    return Ok((body, fallback));
                }
                Err(err) => {
                    debug!("{} pagination rejected for {}: {}", fallback, path, err);
                    last_error = err;
                }
            }
        }

        Err(last_error)
    }
}

impl std::fmt::Debug for GuestyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuestyClient")
            .field("base_url", &self.config.base_url)
            .field("retry", &self.config.retry)
            .finish()
    }
}

/// A single logical request with token refresh and backoff, but no
/// pagination negotiation. Fallback candidates are issued through this type,
/// so negotiation cannot recurse.
#[derive(Debug, Clone, Copy)]
pub struct DirectRequest<'a> {
    client: &'a GuestyClient,
}

impl DirectRequest<'_> {
    /// Perform the request.
    ///
    /// - 401: the token is invalidated and the request retried immediately.
    /// - 429, 5xx and connection failures: retried after `base * 2^attempt`.
    /// - anything else non-2xx: returned as [`GuestyError::Remote`].
    #[instrument(skip(self, params), fields(params = ?params.as_slice()))]
    pub async fn request(&self, method: Method, path: &str, params: &QueryParams) -> Result<Value> {
        let client = self.client;
        let policy = client.config.retry;
        let url = client.config.endpoint_url(path);
        let mut attempt: u32 = 0;

        loop {
            let token = client.tokens.get_token().await?;

            debug!("{} {} (attempt {})", method, url, attempt + 1);

            let sent = client
                .http
                .request(method.clone(), &url)
                .bearer_auth(&token)
                .header("Content-Type", "application/json")
                .query(params.as_slice())
                .send()
                .await;

            let response = match sent {
                Ok(response) => response,
                Err(e) if e.is_timeout() || e.is_connect() => {
                    if attempt >= policy.max_retries {
                        return Err(GuestyError::ExhaustedRetries {
                            attempts: attempt + 1,
                            last_error: e.to_string(),
                        });
                    }
                    let delay = policy.delay_for(attempt);
                    warn!("Transport error on {}: {}, retrying in {:?}", path, e, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                Err(e) => return Err(GuestyError::Http(e)),
            };

            let status = response.status();
            if status.is_success() {
                return Ok(response.json::<Value>().await?);
            }

            if status == StatusCode::UNAUTHORIZED {
                client.tokens.invalidate().await;
                if attempt >= policy.max_retries {
                    return Err(GuestyError::Auth(format!(
                        "{} still unauthorized after {} token refreshes",
                        path, attempt
                    )));
                }
                warn!("Guesty returned 401 for {}, refreshing token", path);
                attempt += 1;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            let error = GuestyError::Remote {
                status: status.as_u16(),
                message: body,
            };

            if error.is_skip_rejection() {
                return Err(error);
            }

            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                if attempt >= policy.max_retries {
                    return Err(GuestyError::ExhaustedRetries {
                        attempts: attempt + 1,
                        last_error: error.to_string(),
                    });
                }
                let delay = policy.delay_for(attempt);
                warn!("Guesty returned {} for {}, waiting {:?} before retry", status, path, delay);
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            return Err(error);
        }
    }
}
