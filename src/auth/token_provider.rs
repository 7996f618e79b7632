use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::header::{ACCEPT, AUTHORIZATION};
use http::StatusCode;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::cache::cache_key::derive_cache_key;
use crate::cache::token::CachedToken;
use crate::cache::token_cache::TokenCache;
use crate::client::response::read_json;
use crate::config::settings::{ClientConfig, Credentials};
use crate::error::{Result, ShippingError};
use crate::helpers::time::{get_instant, now_utc};
use crate::observability::metrics::get_metrics;
use crate::resilience::single_flight::SingleFlight;
use crate::utils::constants::{GRANT_TYPE_CLIENT_CREDENTIALS, OAUTH_TOKEN_PATH, SHIPPING_SERVICES_SEGMENT};

/// Authorization endpoint for a shipping services base url.
pub fn derive_token_url(base_url: &str) -> String {
    let root = base_url.replacen(SHIPPING_SERVICES_SEGMENT, "", 1);
    format!("{}{}", root.trim_end_matches('/'), OAUTH_TOKEN_PATH)
}

/// Hands out bearer tokens, calling the authorization endpoint only on a cache miss.
#[derive(Debug, Clone)]
pub struct TokenProvider {
    inner: Arc<Inner>,
    cache: TokenCache<CachedToken>,
    flights: SingleFlight<Result<CachedToken>>,
}

#[derive(Debug)]
struct Inner {
    credentials: Credentials,
    token_url: String,
    cache_key: String,
    client: Client,
}

impl TokenProvider {
    pub fn new(config: &ClientConfig, client: Client, cache: TokenCache<CachedToken>) -> Self {
        let token_url = derive_token_url(&config.base_url);
        let cache_key = config
            .cache_key
            .clone()
            .unwrap_or_else(|| derive_cache_key(&config.credentials, &token_url));
        debug!("token provider for {} uses cache key '{}'", token_url, cache_key);

        Self {
            inner: Arc::new(Inner {
                credentials: config.credentials.clone(),
                token_url,
                cache_key,
                client,
            }),
            cache,
            flights: SingleFlight::new(),
        }
    }

    pub fn cache_key(&self) -> &str {
        &self.inner.cache_key
    }

    pub fn token_url(&self) -> &str {
        &self.inner.token_url
    }

    pub fn cache(&self) -> &TokenCache<CachedToken> {
        &self.cache
    }

    /// Cached token if still fresh, otherwise a new one from the authorization endpoint.
    pub async fn get_token(&self) -> Result<CachedToken> {
        let metrics = get_metrics().await;
        if let Some(m) = metrics {
            m.token_requests.inc();
        }

        if let Some(token) = self.cache.get(self.cache_key()).await {
            if let Some(m) = metrics {
                m.token_cache_hits.inc();
            }
            return Ok(token);
        }
        if let Some(m) = metrics {
            m.token_cache_misses.inc();
        }

        self.flights
            .run(self.cache_key(), move || async move {
                // a flight that just finished may have filled the cache
                if let Some(token) = self.cache.get(self.cache_key()).await {
                    return Ok(token);
                }
                self.fetch_and_store().await
            })
            .await
    }

    /// Drop the cached token so the next call re-authorizes.
    pub async fn invalidate(&self) {
        info!("invalidating cached token '{}'", self.cache_key());
        self.cache.delete(self.cache_key()).await;
    }

    async fn fetch_and_store(&self) -> Result<CachedToken> {
        let start = get_instant();
        let result = self.fetch_token().await;
        let elapsed = start.elapsed().as_secs_f64();

        if let Some(m) = get_metrics().await {
            let outcome = if result.is_ok() { "success" } else { "failure" };
            m.token_fetch_duration.with_label_values(&[outcome]).observe(elapsed);
            if let Err(err) = &result {
                m.token_fetch_failures.with_label_values(&[failure_reason(err)]).inc();
            }
        }

        let token = result.inspect_err(|err| warn!("token request to {} failed: {}", self.token_url(), err))?;
        let ttl_ms = token.cache_ttl_ms();
        self.cache.put(self.cache_key(), token.clone(), ttl_ms).await;
        info!(
            "fetched token from {}, expires in {}s, cached for {}ms",
            self.token_url(),
            token.expires_in_seconds,
            ttl_ms
        );
        Ok(token)
    }

    async fn fetch_token(&self) -> Result<CachedToken> {
        let credentials = &self.inner.credentials;
        let basic = STANDARD.encode(format!("{}:{}", credentials.api_key, credentials.api_secret));

        debug!("requesting token from {}", self.token_url());
        let response = self
            .inner
            .client
            .post(self.token_url())
            .header(AUTHORIZATION, format!("Basic {}", basic))
            .header(ACCEPT, "application/json")
            .form(&[("grant_type", GRANT_TYPE_CLIENT_CREDENTIALS)])
            .send()
            .await?;

        let body = read_json(response, StatusCode::OK).await?;
        CachedToken::from_response(body, now_utc())
    }
}

fn failure_reason(err: &ShippingError) -> &'static str {
    match err {
        ShippingError::Transport(_) => "transport",
        ShippingError::Http { .. } => "http",
        ShippingError::Decode(_) => "decode",
    }
}
