use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use http::{Method, StatusCode};
use reqwest::{Client, RequestBuilder, Url};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::auth::token_provider::TokenProvider;
use crate::cache::token::CachedToken;
use crate::cache::token_cache::TokenCache;
use crate::client::options::ShipmentOptions;
use crate::client::response::{read_json, read_text};
use crate::config::loader::file_to_config;
use crate::config::settings::ClientConfig;
use crate::error::{Result, ShippingError};
use crate::helpers::time::get_instant;
use crate::observability::metrics::get_metrics;
use crate::utils::constants::{DEFAULT_CARRIER, TLS_TEST_PATH, TLS_TEST_SUCCESS};
use crate::utils::logging::init_logging;

const OP_CREATE_SHIPMENT: &str = "create_shipment";
const OP_RATE: &str = "rate";
const OP_TRACKING: &str = "tracking";
const OP_VALIDATE_ADDRESS: &str = "validate_address";
const OP_TLS_TEST: &str = "tls_test";

/// Shipping services client. Cheap to clone; clones share the token cache.
#[derive(Debug, Clone)]
pub struct ShippingClient {
    config: Arc<ClientConfig>,
    http: Client,
    tokens: TokenProvider,
}

impl ShippingClient {
    /// Client with its own token cache.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_cache(config, TokenCache::new())
    }

    /// Client sharing `cache` with other clients.
    pub fn with_cache(config: ClientConfig, cache: TokenCache<CachedToken>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout_ms) = config.request_timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        let http = builder.build()?;
        let tokens = TokenProvider::new(&config, http.clone(), cache);
        Ok(Self { config: Arc::new(config), http, tokens })
    }

    /// Load config from a YAML file, set up logging if it has a `logging`
    /// section, and build the client.
    pub async fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config = file_to_config(path.as_ref()).await?;
        if let Some(logging) = &config.logging {
            if !init_logging(logging) {
                debug!("tracing subscriber already installed, keeping it");
            }
        }
        Ok(Self::new(config)?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn token_provider(&self) -> &TokenProvider {
        &self.tokens
    }

    /// POST /v1/shipments, expects 201.
    pub async fn create_shipment<T: Serialize + ?Sized>(&self, shipment: &T, options: &ShipmentOptions) -> Result<Value> {
        let mut request = self.authorized(Method::POST, &["v1", "shipments"]).await?.json(shipment);
        for (name, value) in options.headers() {
            request = request.header(name, value);
        }
        self.execute(OP_CREATE_SHIPMENT, request, StatusCode::CREATED).await
    }

    /// POST /v1/rates
    pub async fn rate<T: Serialize + ?Sized>(&self, shipment: &T) -> Result<Value> {
        let request = self.authorized(Method::POST, &["v1", "rates"]).await?.json(shipment);
        self.execute(OP_RATE, request, StatusCode::OK).await
    }

    /// GET /v1/tracking/{tracking_number}; `carrier` falls back to the configured one.
    /// The tracking number is sent as a single encoded path segment.
    pub async fn tracking(&self, tracking_number: &str, carrier: Option<&str>) -> Result<Value> {
        let carrier = resolve_carrier(carrier, &self.config.carrier);
        let request = self
            .authorized(Method::GET, &["v1", "tracking", tracking_number])
            .await?
            .query(&[("packageIdentifierType", "TrackingNumber"), ("carrier", carrier)]);
        self.execute(OP_TRACKING, request, StatusCode::OK).await
    }

    /// POST /v1/addresses/verify
    pub async fn validate_address<T: Serialize + ?Sized>(&self, address: &T, minimal_validation: bool) -> Result<Value> {
        let request = self
            .authorized(Method::POST, &["v1", "addresses", "verify"])
            .await?
            .query(&[("minimalAddressValidation", minimal_validation)])
            .json(address);
        self.execute(OP_VALIDATE_ADDRESS, request, StatusCode::OK).await
    }

    /// Unauthenticated connectivity check, returns the body verbatim.
    pub async fn tls_test(&self) -> Result<String> {
        let url = format!("{}{}", self.config.base_test_url.trim_end_matches('/'), TLS_TEST_PATH);
        debug!("tls test against {}", url);
        let start = get_instant();
        let result = match self.http.get(&url).send().await {
            Ok(response) => read_text(response, StatusCode::OK).await,
            Err(err) => Err(err.into()),
        };
        record(OP_TLS_TEST, &result, start.elapsed()).await;
        if let Ok(body) = &result {
            if body != TLS_TEST_SUCCESS {
                warn!("tls test answered 200 with unexpected body '{}'", body);
            }
        }
        result
    }

    async fn authorized(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let token = self.tokens.get_token().await?;
        let url = service_url(&self.config.base_url, segments)?;
        Ok(self.http.request(method, url).bearer_auth(&token.access_token))
    }

    async fn execute(&self, operation: &'static str, request: RequestBuilder, expected: StatusCode) -> Result<Value> {
        let start = get_instant();
        let result = match request.send().await {
            Ok(response) => read_json(response, expected).await,
            Err(err) => Err(err.into()),
        };
        record(operation, &result, start.elapsed()).await;
        match &result {
            Ok(_) => info!("{} succeeded", operation),
            Err(err) => warn!("{} failed: {}", operation, err),
        }
        result
    }
}

/// `base` with `segments` appended, each percent-encoded as one path segment.
fn service_url(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base).map_err(ShippingError::transport)?;
    url.path_segments_mut()
        .map_err(|_| {
            ShippingError::transport(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("'{}' cannot be used as a base url", base),
            ))
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

// blank means unset, at both levels
fn resolve_carrier<'a>(requested: Option<&'a str>, configured: &'a str) -> &'a str {
    requested
        .into_iter()
        .chain([configured])
        .find(|carrier| !carrier.trim().is_empty())
        .unwrap_or(DEFAULT_CARRIER)
}

async fn record<T>(operation: &str, result: &Result<T>, elapsed: Duration) {
    let Some(metrics) = get_metrics().await else {
        return;
    };
    let status = match result {
        Ok(_) => "ok".to_owned(),
        Err(err) => err.status().map(|s| s.as_u16().to_string()).unwrap_or_else(|| "transport".to_owned()),
    };
    metrics.service_requests.with_label_values(&[operation, status.as_str()]).inc();
    metrics.service_request_duration.with_label_values(&[operation]).observe(elapsed.as_secs_f64());
}
