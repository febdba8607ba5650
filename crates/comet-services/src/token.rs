//! The credential refresh service.
//!
//! One [`TokenManager`] exists per process. Every session borrows it, so a
//! token refreshed while serving one client is what the next client gets.
//!
//! The manager itself does no networking: it hands the refresh token to a
//! [`TokenEndpoint`] and stores whatever grant comes back.
//! [`HttpTokenEndpoint`] is the production endpoint; tests plug in fakes.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use comet_credentials::ACCOUNT_ID;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::ServiceError;

/// Base URL of the GOG authentication service.
pub const DEFAULT_AUTH_URL: &str = "https://auth.gog.com";

/// Public client secret paired with [`ACCOUNT_ID`].
const CLIENT_SECRET: &str = "9d85c43b1482497dbbce61f6e4aa173a433796eeae2ca8c5f6129f2dc4de46d9";

/// A token is treated as expired this long before the server says it is.
const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// CredentialRefresh
// ---------------------------------------------------------------------------

/// What a session needs from the credential refresh service.
///
/// Methods take `&self`: implementations synchronise internally, so the
/// dispatcher can hand out plain shared references.
pub trait CredentialRefresh: Send + Sync + 'static {
    /// The account's user id. Never changes.
    fn user_id(&self) -> &str;

    /// Returns an access token, refreshing first if the current one is
    /// known to be expired.
    fn access_token(&self) -> impl Future<Output = Result<String, ServiceError>> + Send;

    /// Exchanges the refresh token for a new access token unconditionally
    /// and returns it.
    fn refresh(&self) -> impl Future<Output = Result<String, ServiceError>> + Send;
}

// ---------------------------------------------------------------------------
// TokenEndpoint
// ---------------------------------------------------------------------------

/// A successful answer from a token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Some endpoints rotate the refresh token, some don't.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of `access_token` in seconds, when known.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Performs the OAuth2 refresh-token grant.
pub trait TokenEndpoint: Send + Sync + 'static {
    fn exchange(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<TokenGrant, ServiceError>> + Send;
}

impl<E: TokenEndpoint> TokenEndpoint for Arc<E> {
    fn exchange(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<TokenGrant, ServiceError>> + Send {
        (**self).exchange(refresh_token)
    }
}

/// [`TokenEndpoint`] that talks to the GOG auth service over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpTokenEndpoint {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTokenEndpoint {
    /// Endpoint rooted at [`DEFAULT_AUTH_URL`].
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_AUTH_URL)
    }

    /// Endpoint rooted at `base_url` (no trailing slash needed).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl Default for HttpTokenEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenEndpoint for HttpTokenEndpoint {
    async fn exchange(&self, refresh_token: &str) -> Result<TokenGrant, ServiceError> {
        let response = self
            .client
            .get(format!("{}/token", self.base_url))
            .query(&[
                ("client_id", ACCOUNT_ID),
                ("client_secret", CLIENT_SECRET),
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::TokenRejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<TokenGrant>().await?)
    }
}

// ---------------------------------------------------------------------------
// TokenManager
// ---------------------------------------------------------------------------

/// The mutable half of the manager: what a refresh replaces.
#[derive(Debug)]
struct TokenState {
    access_token: String,
    refresh_token: String,
    /// `None` until a grant tells us the lifetime.
    expires_at: Option<Instant>,
}

impl TokenState {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at
            .is_some_and(|at| at.saturating_duration_since(now) <= EXPIRY_MARGIN)
    }
}

/// Owns the account's current tokens and refreshes them on demand.
///
/// The state sits behind an async mutex held for the whole refresh, so two
/// callers never spend the same refresh token twice.
#[derive(Debug)]
pub struct TokenManager<E = HttpTokenEndpoint> {
    user_id: String,
    endpoint: E,
    state: Mutex<TokenState>,
}

impl<E: TokenEndpoint> TokenManager<E> {
    /// Creates a manager from the resolved credentials.
    ///
    /// The initial access token's lifetime is unknown, so it is used as-is
    /// until the first refresh.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        user_id: impl Into<String>,
        endpoint: E,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            endpoint,
            state: Mutex::new(TokenState {
                access_token: access_token.into(),
                refresh_token: refresh_token.into(),
                expires_at: None,
            }),
        }
    }

    /// The refresh token that the next refresh will spend.
    pub async fn current_refresh_token(&self) -> String {
        self.state.lock().await.refresh_token.clone()
    }

    async fn refresh_locked(&self, state: &mut TokenState) -> Result<String, ServiceError> {
        let grant = self.endpoint.exchange(&state.refresh_token).await?;
        let expires_at = grant.expires_in.and_then(expiry_instant);

        state.access_token = grant.access_token;
        if let Some(refresh_token) = grant.refresh_token {
            state.refresh_token = refresh_token;
        }
        state.expires_at = expires_at;

        tracing::info!(
            user_id = %self.user_id,
            expires_in = ?grant.expires_in,
            "access token refreshed"
        );
        Ok(state.access_token.clone())
    }
}

/// When a token granted `secs` from now expires. A lifetime too large to
/// represent counts as no known expiry.
fn expiry_instant(secs: u64) -> Option<Instant> {
    Instant::now().checked_add(Duration::from_secs(secs))
}

impl<E: TokenEndpoint> CredentialRefresh for TokenManager<E> {
    fn user_id(&self) -> &str {
        &self.user_id
    }

    async fn access_token(&self) -> Result<String, ServiceError> {
        let mut state = self.state.lock().await;
        if state.is_expired(Instant::now()) {
            tracing::debug!(user_id = %self.user_id, "access token expired, refreshing");
            return self.refresh_locked(&mut state).await;
        }
        Ok(state.access_token.clone())
    }

    async fn refresh(&self) -> Result<String, ServiceError> {
        let mut state = self.state.lock().await;
        self.refresh_locked(&mut state).await
    }
}
