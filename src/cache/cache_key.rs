use sha2::{Digest, Sha256};

use crate::config::settings::Credentials;

pub const CACHE_KEY_PREFIX: &str = "pb-oauth-token:";

/// Slot for a credential pair at a given authorization endpoint.
///
/// Same key + endpoint always share a slot; anything else never collides.
/// The secret is left out so it never ends up in logs or metrics labels.
pub fn derive_cache_key(credentials: &Credentials, token_url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(credentials.api_key.as_bytes());
    hasher.update(b"\n");
    hasher.update(token_url.as_bytes());
    format!("{}{:x}", CACHE_KEY_PREFIX, hasher.finalize())
}
