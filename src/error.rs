use std::sync::Arc;

use http::StatusCode;
use serde_json::Value;
use thiserror::Error;

pub type Result<T, E = ShippingError> = std::result::Result<T, E>;

/// Errors surfaced by token acquisition and the service operations.
///
/// Cloneable so a single authorization failure can be handed to every
/// caller waiting on the same in-flight exchange.
#[derive(Debug, Clone, Error)]
pub enum ShippingError {
    /// DNS, connection, TLS, malformed URL or timeout. Never retried.
    #[error("transport error: {0}")]
    Transport(#[source] Arc<dyn std::error::Error + Send + Sync>),

    /// Response status differed from the one the operation expects.
    #[error("http error {status}: {detail}")]
    Http { status: StatusCode, detail: Value },

    /// The authorization endpoint answered 200 without a usable token.
    #[error("invalid token response: {0}")]
    Decode(#[source] Arc<serde_json::Error>),
}

impl ShippingError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ShippingError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn detail(&self) -> Option<&Value> {
        match self {
            ShippingError::Http { detail, .. } => Some(detail),
            _ => None,
        }
    }

    pub fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ShippingError::Transport(Arc::new(err))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ShippingError::Transport(_))
    }
}

impl From<reqwest::Error> for ShippingError {
    fn from(err: reqwest::Error) -> Self {
        ShippingError::transport(err)
    }
}

impl From<serde_json::Error> for ShippingError {
    fn from(err: serde_json::Error) -> Self {
        ShippingError::Decode(Arc::new(err))
    }
}
