use std::fmt;

use serde::Deserialize;

use crate::utils::constants::{DEFAULT_BASE_TEST_URL, DEFAULT_BASE_URL, DEFAULT_CARRIER};

/// ================================
/// Client configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    #[serde(flatten)]
    pub credentials: Credentials,
    /// shipping services root, e.g. https://api.pitneybowes.com/shippingservices
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// host serving the unauthenticated tls test
    #[serde(default = "default_base_test_url")]
    pub base_test_url: String,
    #[serde(default = "default_carrier")]
    pub carrier: String,
    /// fixed cache slot; derived from the credentials when absent
    #[serde(default)]
    pub cache_key: Option<String>,
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            base_url: default_base_url(),
            base_test_url: default_base_test_url(),
            carrier: default_carrier(),
            cache_key: None,
            request_timeout_ms: None,
            logging: None,
        }
    }
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self { credentials: Credentials::new(api_key, api_secret), ..Self::default() }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_base_test_url(mut self, base_test_url: impl Into<String>) -> Self {
        self.base_test_url = base_test_url.into();
        self
    }

    pub fn with_carrier(mut self, carrier: impl Into<String>) -> Self {
        self.carrier = carrier.into();
        self
    }

    pub fn with_cache_key(mut self, cache_key: impl Into<String>) -> Self {
        self.cache_key = Some(cache_key.into());
        self
    }

    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = Some(timeout_ms);
        self
    }
}

/// ================================
/// Credentials
/// ================================
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), api_secret: api_secret.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"***")
            .finish()
    }
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String, // allowed: trace, debug, info, warn, error or an EnvFilter directive
    #[serde(default)]
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Compact,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_base_test_url() -> String {
    DEFAULT_BASE_TEST_URL.to_string()
}

fn default_carrier() -> String {
    DEFAULT_CARRIER.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
