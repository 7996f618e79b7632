// tests/common/mod.rs
pub use serde_json::json;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use httpmock::Method::POST;
use httpmock::{Mock, MockServer};
use serde_json::Value;

use crate::config::settings::ClientConfig;

pub const API_KEY: &str = "test-key";
pub const API_SECRET: &str = "test-secret";
pub const ACCESS_TOKEN: &str = "pb-access-token-1";

/// Config pointing both the service and tls test urls at the mock server.
pub fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::new(API_KEY, API_SECRET)
        .with_base_url(format!("{}/shippingservices", server.base_url()))
        .with_base_test_url(server.base_url())
}

pub fn basic_auth_header() -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", API_KEY, API_SECRET)))
}

pub fn bearer_header() -> String {
    format!("Bearer {}", ACCESS_TOKEN)
}

pub fn token_body(expires_in: i64) -> Value {
    json!({
        "access_token": ACCESS_TOKEN,
        "tokenType": "BearerToken",
        "issuedAt": 1_700_000_000_000u64,
        "expiresIn": expires_in,
        "clientID": "client-id",
        "org": "org-id"
    })
}

/// Authorization endpoint that only answers a well-formed credential exchange.
pub fn mock_token_endpoint(server: &MockServer, expires_in: i64) -> Mock<'_> {
    server.mock(|when, then| {
        when.method(POST)
            .path("/oauth/token")
            .header("authorization", basic_auth_header())
            .header("content-type", "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(token_body(expires_in));
    })
}
