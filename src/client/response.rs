use http::StatusCode;
use reqwest::Response;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, ShippingError};

/// Parse a response body leniently: JSON when it is JSON, otherwise the text
/// as a JSON string, `null` when empty.
pub fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_owned()))
}

/// Carrier convention: errors come back as `[{"errorCode": .., "message": ..}, ..]`.
/// Surface the first element when it carries a `message`, the whole body otherwise.
pub fn extract_error_detail(body: Value) -> Value {
    match body {
        Value::Array(mut items)
            if items
                .first()
                .and_then(Value::as_object)
                .is_some_and(|first| first.contains_key("message")) =>
        {
            items.swap_remove(0)
        }
        other => other,
    }
}

/// Read the body and check the status against the one the operation expects.
pub async fn read_text(response: Response, expected: StatusCode) -> Result<String> {
    let status = response.status();
    let text = response.text().await?;
    if status != expected {
        debug!("unexpected status {} (expected {})", status, expected);
        return Err(ShippingError::Http { status, detail: extract_error_detail(parse_body(&text)) });
    }
    Ok(text)
}

pub async fn read_json(response: Response, expected: StatusCode) -> Result<Value> {
    read_text(response, expected).await.map(|text| parse_body(&text))
}
