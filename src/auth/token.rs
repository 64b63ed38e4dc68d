use anyhow::{Context, Result};
use base64::prelude::*;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Access/refresh pair exactly as returned by the login and token refresh
/// endpoints, and as persisted by the token store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Claims embedded in the access token payload.
///
/// The server adds `username` next to the standard `user_id` and `exp`;
/// unrelated claims (`iat`, `jti`, `token_type`) are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub username: String,
    pub exp: i64,
}

impl Claims {
    /// True when the token expires within `leeway_secs` from now.
    pub fn expired(&self, leeway_secs: i64) -> bool {
        Utc::now().timestamp() + leeway_secs >= self.exp
    }
}

/// Decodes the payload segment of a JWT. Signature is not checked: the
/// client only reads its own identity out of the token, the server
/// validates it on every request.
pub fn decode_claims(token: &str) -> Result<Claims> {
    let payload = token
        .split('.')
        .nth(1)
        .context("access token has no payload segment")?;
    let bytes = BASE64_URL_SAFE_NO_PAD
        .decode(payload)
        .context("access token payload is not base64url")?;
    serde_json::from_slice(&bytes).context("access token payload is not valid claims JSON")
}
