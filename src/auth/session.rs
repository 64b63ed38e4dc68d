//! Session lifecycle: Anonymous -> (login) -> Active -> (logout or refresh
//! failure) -> Anonymous. A successful refresh keeps the session Active
//! with the token contents swapped in place.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::client::error_message;
use crate::auth::store::TokenStore;
use crate::auth::token::{decode_claims, Claims, TokenPair};
use crate::config::Config;

/// Seconds before `exp` at which the access token is treated as expired,
/// so a request never leaves with a token about to lapse in flight.
const EXPIRY_LEEWAY_SECS: i64 = 30;

/// Identity of the logged-in user, always derived from the access token
/// payload and never stored on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: u64,
    pub username: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server refused the operation (bad credentials, taken username,
    /// revoked refresh token, ...).
    #[error("{0}")]
    Rejected(String),
}

struct ActiveSession {
    tokens: TokenPair,
    claims: Claims,
}

impl ActiveSession {
    fn user(&self) -> AuthUser {
        AuthUser {
            id: self.claims.user_id,
            username: self.claims.username.clone(),
        }
    }
}

/// Owns the token store and the auth endpoints. Everything else reads the
/// current access token through [`SessionManager::valid_access_token`];
/// only this type ever writes the store.
pub struct SessionManager {
    http: reqwest::Client,
    base_url: String,
    store: TokenStore,
    state: Mutex<Option<ActiveSession>>,
}

impl SessionManager {
    /// Builds the manager and restores a session from stored tokens if
    /// present. A stored token that no longer decodes is discarded and
    /// the session starts anonymous.
    pub fn new(config: &Config, store: TokenStore) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let state = match store.load() {
            Ok(Some(tokens)) => match decode_claims(&tokens.access) {
                Ok(claims) => Some(ActiveSession { tokens, claims }),
                Err(err) => {
                    warn!("stored access token is unreadable, discarding: {err:#}");
                    if let Err(err) = store.clear() {
                        warn!("failed to clear stored tokens: {err:#}");
                    }
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!("failed to load stored tokens: {err:#}");
                None
            }
        };

        Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            store,
            state: Mutex::new(state),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn state(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.state().as_ref().map(ActiveSession::user)
    }

    pub fn is_active(&self) -> bool {
        self.state().is_some()
    }

    /// Submits credentials; on success the returned pair becomes the
    /// active session. On failure local state is untouched.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthUser, AuthError> {
        let response = self
            .http
            .post(self.url("/api/login/"))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AuthError::Rejected(error_message(response).await));
        }

        let tokens: TokenPair = response.json().await?;
        let claims = decode_claims(&tokens.access)
            .map_err(|err| AuthError::Rejected(format!("server returned an unreadable token: {err}")))?;

        if let Err(err) = self.store.save(&tokens) {
            warn!("failed to persist tokens, session will not survive restart: {err:#}");
        }

        let session = ActiveSession { tokens, claims };
        let user = session.user();
        debug!(username = %user.username, "logged in");
        *self.state() = Some(session);
        Ok(user)
    }

    /// Creates an account. A confirmation mismatch fails locally without
    /// any network traffic. Never touches the active session.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        confirmation: &str,
    ) -> Result<(), AuthError> {
        if password != confirmation {
            return Err(AuthError::PasswordMismatch);
        }

        let response = self
            .http
            .post(self.url("/api/register/"))
            .json(&serde_json::json!({
                "username": username,
                "password": password,
                "confirmation": confirmation,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AuthError::Rejected(error_message(response).await));
        }
        Ok(())
    }

    /// Clears the session locally first, then makes a best-effort attempt
    /// to invalidate the refresh token server-side. A network failure
    /// never blocks the logout.
    pub async fn logout(&self) {
        let Some(session) = self.clear_local() else {
            return;
        };

        let result = self
            .http
            .post(self.url("/api/logout/"))
            .bearer_auth(&session.tokens.access)
            .json(&serde_json::json!({ "refresh": session.tokens.refresh }))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!("refresh token invalidated server-side");
            }
            Ok(response) => {
                debug!(status = %response.status(), "server declined logout notification");
            }
            Err(err) => {
                debug!("logout notification failed: {err}");
            }
        }
    }

    /// Exchanges the refresh token for a new access token (and possibly a
    /// rotated refresh token). Any failure forces a local logout.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let Some(refresh) = self.state().as_ref().map(|s| s.tokens.refresh.clone()) else {
            return Ok(());
        };

        match self.exchange_refresh(&refresh).await {
            Ok(session) => {
                if let Err(err) = self.store.save(&session.tokens) {
                    warn!("failed to persist refreshed tokens: {err:#}");
                }
                debug!(username = %session.claims.username, "access token refreshed");
                *self.state() = Some(session);
                Ok(())
            }
            Err(err) => {
                warn!("token refresh failed, logging out: {err}");
                self.clear_local();
                Err(err)
            }
        }
    }

    async fn exchange_refresh(&self, refresh: &str) -> Result<ActiveSession, AuthError> {
        #[derive(Deserialize)]
        struct RefreshResponse {
            access: String,
            // Present only when the server rotates refresh tokens.
            refresh: Option<String>,
        }

        let response = self
            .http
            .post(self.url("/api/token/refresh/"))
            .json(&serde_json::json!({ "refresh": refresh }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AuthError::Rejected(error_message(response).await));
        }

        let body: RefreshResponse = response.json().await?;
        let tokens = TokenPair {
            access: body.access,
            refresh: body.refresh.unwrap_or_else(|| refresh.to_string()),
        };
        let claims = decode_claims(&tokens.access)
            .map_err(|err| AuthError::Rejected(format!("refreshed token is unreadable: {err}")))?;
        Ok(ActiveSession { tokens, claims })
    }

    /// Bearer credential for an outgoing request: the current access
    /// token, refreshed first if it is about to expire. `None` when
    /// anonymous (including when an opportunistic refresh just failed
    /// and ended the session).
    pub async fn valid_access_token(&self) -> Option<String> {
        let (access, expired) = {
            let guard = self.state();
            let session = guard.as_ref()?;
            (
                session.tokens.access.clone(),
                session.claims.expired(EXPIRY_LEEWAY_SECS),
            )
        };

        if !expired {
            return Some(access);
        }

        if self.refresh().await.is_err() {
            return None;
        }
        self.state().as_ref().map(|s| s.tokens.access.clone())
    }

    /// Recurring refresh timer. Ticks do nothing while anonymous; a
    /// failed refresh has already logged the session out, so the task
    /// just keeps ticking for the next login.
    pub fn spawn_refresh_task(self: Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick of a tokio interval fires immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !self.is_active() {
                    continue;
                }
                if let Err(err) = self.refresh().await {
                    debug!("scheduled token refresh failed: {err}");
                }
            }
        })
    }

    fn clear_local(&self) -> Option<ActiveSession> {
        let prior = self.state().take();
        if prior.is_some() {
            if let Err(err) = self.store.clear() {
                warn!("failed to clear stored tokens: {err:#}");
            }
        }
        prior
    }
}
