use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::session::SessionManager;
use crate::config::Config;
use crate::models::{Comment, FeedPage, FollowingPage, LikeOutcome, Profile, Tweet};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// 401: the request needed a session it didn't have (or the token was
    /// no longer accepted).
    #[error("authentication required")]
    Unauthorized,

    /// Caught locally before any network call (empty content, length).
    #[error("{0}")]
    Validation(String),

    /// Non-2xx response, message taken from the body when the server
    /// provided one.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// 2xx response whose body reports the operation was refused.
    #[error("{0}")]
    Rejected(String),
}

/// The HTTP gateway, as a seam so view logic can be driven by a fake.
#[async_trait]
pub trait Api: Send + Sync {
    async fn home_feed(&self, page: u32) -> Result<FeedPage, ApiError>;
    async fn following_feed(&self, page: u32) -> Result<FollowingPage, ApiError>;
    async fn tweet_detail(&self, id: u64) -> Result<Tweet, ApiError>;
    async fn create_tweet(&self, text: &str) -> Result<Tweet, ApiError>;
    async fn edit_tweet(&self, id: u64, text: &str) -> Result<Tweet, ApiError>;
    async fn toggle_like(&self, id: u64) -> Result<LikeOutcome, ApiError>;
    async fn add_comment(&self, id: u64, text: &str) -> Result<Comment, ApiError>;
    async fn profile(&self, username: &str) -> Result<Profile, ApiError>;
    async fn toggle_follow(&self, username: &str) -> Result<(), ApiError>;
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionManager>,
}

impl ApiClient {
    pub fn new(config: &Config, session: Arc<SessionManager>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attaches the current access token as a bearer credential when a
    /// session is active; anonymous requests go out bare.
    async fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.session.valid_access_token().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl Api for ApiClient {
    async fn home_feed(&self, page: u32) -> Result<FeedPage, ApiError> {
        let request = self.http.get(self.url("/api/home")).query(&[("page", page)]);
        let response = self.authed(request).await.send().await?;
        Ok(checked(response).await?.json().await?)
    }

    async fn following_feed(&self, page: u32) -> Result<FollowingPage, ApiError> {
        let request = self
            .http
            .get(self.url("/api/following-feed/"))
            .query(&[("page", page)]);
        let response = self.authed(request).await.send().await?;
        Ok(checked(response).await?.json().await?)
    }

    async fn tweet_detail(&self, id: u64) -> Result<Tweet, ApiError> {
        let request = self.http.get(self.url(&format!("/api/tweet/{}/", id)));
        let response = self.authed(request).await.send().await?;
        Ok(checked(response).await?.json().await?)
    }

    async fn create_tweet(&self, text: &str) -> Result<Tweet, ApiError> {
        let request = self
            .http
            .post(self.url("/api/tweet/"))
            .json(&serde_json::json!({ "tweet": text }));
        let response = self.authed(request).await.send().await?;
        Ok(checked(response).await?.json().await?)
    }

    async fn edit_tweet(&self, id: u64, text: &str) -> Result<Tweet, ApiError> {
        let request = self
            .http
            .put(self.url(&format!("/api/tweet/{}/", id)))
            .json(&serde_json::json!({ "tweet": text }));
        let response = self.authed(request).await.send().await?;
        Ok(checked(response).await?.json().await?)
    }

    async fn toggle_like(&self, id: u64) -> Result<LikeOutcome, ApiError> {
        let request = self
            .http
            .post(self.url(&format!("/api/tweet/like-unlike/{}/", id)));
        let response = self.authed(request).await.send().await?;
        Ok(checked(response).await?.json().await?)
    }

    async fn add_comment(&self, id: u64, text: &str) -> Result<Comment, ApiError> {
        let request = self
            .http
            .post(self.url(&format!("/api/tweet/comment/{}/", id)))
            .json(&serde_json::json!({ "comment": text }));
        let response = self.authed(request).await.send().await?;
        Ok(checked(response).await?.json().await?)
    }

    async fn profile(&self, username: &str) -> Result<Profile, ApiError> {
        let request = self.http.get(self.url(&format!(
            "/api/profile/{}/",
            urlencoding::encode(username)
        )));
        let response = self.authed(request).await.send().await?;
        Ok(checked(response).await?.json().await?)
    }

    async fn toggle_follow(&self, username: &str) -> Result<(), ApiError> {
        let request = self.http.post(self.url(&format!(
            "/api/profile/{}/",
            urlencoding::encode(username)
        )));
        let response = self.authed(request).await.send().await?;
        checked(response).await?;
        Ok(())
    }
}

async fn checked(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    Err(ApiError::Server {
        status: status.as_u16(),
        message: error_message(response).await,
    })
}

/// Pulls a human-readable message out of an error response body. The
/// server variously uses `detail`, `error`, and `message`; fall back to
/// the raw body, then the status line.
pub(crate) async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    let fallback = || {
        format!(
            "request failed with status {}",
            status.canonical_reason().unwrap_or(status.as_str())
        )
    };

    let Ok(body) = response.text().await else {
        return fallback();
    };

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&body) {
        for key in ["detail", "error", "message"] {
            if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
                return message.to_string();
            }
        }
        if let Some(message) = value.as_str() {
            return message.to_string();
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() <= 200 && !trimmed.starts_with('<') {
        return trimmed.to_string();
    }
    fallback()
}
