use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::helpers::time::half_life_ttl_ms;

/// Token returned by the authorization endpoint together with the raw body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedToken {
    pub access_token: String,
    pub token_type: Option<String>,
    pub expires_in_seconds: f64,
    pub issued_at: DateTime<Utc>,
    /// Decoded response body, stored verbatim.
    pub raw: Value,
}

// field naming differs between carrier API versions
#[derive(Debug, Deserialize)]
struct TokenFields {
    access_token: String,
    #[serde(default, alias = "tokenType")]
    token_type: Option<String>,
    #[serde(rename = "expiresIn", alias = "expires_in", deserialize_with = "expiry_seconds")]
    expires_in: f64,
}

// any JSON number, or a number sent as a string
fn expiry_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Expiry {
        Number(f64),
        Text(String),
    }

    let seconds = match Expiry::deserialize(deserializer)? {
        Expiry::Number(seconds) => seconds,
        Expiry::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("expiry '{}' is not a number", text)))?,
    };
    if !seconds.is_finite() {
        return Err(de::Error::custom("expiry is not a finite number"));
    }
    Ok(seconds)
}

impl CachedToken {
    pub fn from_response(raw: Value, issued_at: DateTime<Utc>) -> Result<Self> {
        let fields = TokenFields::deserialize(&raw)?;
        Ok(Self {
            access_token: fields.access_token,
            token_type: fields.token_type,
            expires_in_seconds: fields.expires_in,
            issued_at,
            raw,
        })
    }

    /// How long the token may be served from cache.
    pub fn cache_ttl_ms(&self) -> i64 {
        half_life_ttl_ms(self.expires_in_seconds)
    }
}
