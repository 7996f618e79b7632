use chrono::{DateTime, Utc};
use tokio::time::Instant;

pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Monotonic clock used for cache expiry; follows tokio's paused clock in tests.
pub fn get_instant() -> Instant {
    Instant::now()
}

/// Cache lifetime for a token the carrier reports as valid for
/// `expires_in_seconds`: half of it, in milliseconds. Saturates at the `i64`
/// bounds; a non-finite expiry yields 0 so nothing gets cached.
pub fn half_life_ttl_ms(expires_in_seconds: f64) -> i64 {
    if !expires_in_seconds.is_finite() {
        return 0;
    }
    // float to int `as` casts saturate
    (expires_in_seconds * 1000.0 / 2.0) as i64
}
