//! Helpers shared by the integration suites.

#![allow(dead_code)]

use base64::prelude::*;
use chirp::config::Config;

/// Builds a decodable access token with the given identity and expiry.
/// The signature is junk; the client never checks it.
pub fn access_token(user_id: u64, username: &str, exp: i64) -> String {
    let header = BASE64_URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = BASE64_URL_SAFE_NO_PAD.encode(
        serde_json::json!({
            "token_type": "access",
            "user_id": user_id,
            "username": username,
            "exp": exp,
            "jti": "test",
        })
        .to_string(),
    );
    format!("{}.{}.sig", header, payload)
}

/// Expiry far enough out that the token never refreshes mid-test.
pub const FAR_FUTURE: i64 = 4_000_000_000;

pub fn config_for(base_url: &str) -> Config {
    Config {
        api_base_url: base_url.to_string(),
        ..Config::default()
    }
}

pub fn tweet_json(id: u64, likes: u32, comments: u32) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "poster": "alice",
        "tweet": format!("tweet {}", id),
        "date_posted": "2024-01-15T10:30:00Z",
        "likes_count": likes,
        "comments_count": comments,
        "is_liked": false,
        "edited": false,
    })
}
