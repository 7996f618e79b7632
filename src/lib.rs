//! # Pitney Bowes Shipping Client
//!
//! Async client for the carrier's shipping services API. Bearer tokens come
//! from the OAuth2 client-credentials exchange and are cached for half of
//! their reported lifetime; concurrent misses share one authorization call.
//!
//! Modules:
//! - `auth` — token provider (cache lookup, credential exchange)
//! - `cache` — expiring token cache, cached token model, cache key derivation
//! - `client` — shipment, rate, tracking, address and tls test operations
//! - `config` — client configuration and YAML loading
//! - `resilience` — single-flight guard for concurrent token misses
//! - `observability` — prometheus metrics

pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod helpers;
pub mod observability;
pub mod resilience;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::auth::token_provider::TokenProvider;
pub use crate::cache::token::CachedToken;
pub use crate::cache::token_cache::TokenCache;
pub use crate::client::options::ShipmentOptions;
pub use crate::client::shipping::ShippingClient;
pub use crate::config::settings::{ClientConfig, Credentials};
pub use crate::error::{Result, ShippingError};
