//! Manual OAuth 2.0 authorization-code backend (Google by default).
//!
//! Flow: `/api/auth/google` redirects with a random `state` that is also pinned in a
//! short-lived cookie. The callback checks `state`, exchanges the code, fetches the
//! profile, upserts the user and opens a server-side session keyed by an opaque id.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::HeaderMap;
use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::cookies::{read_cookie, SESSION_COOKIE};
use crate::auth::session::SessionStore;
use crate::auth::users::UserStore;
use crate::auth::{AuthKind, Authenticator, UserIdentity};
use crate::config::GoogleOAuthConfig;
use crate::errors::AppError;

const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const SCOPES: &str = "openid profile email";

/// Provider endpoints. Google unless overridden.
#[derive(Debug, Clone)]
pub struct OAuthEndpoints {
    pub authorize_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl Default for OAuthEndpoints {
    fn default() -> Self {
        Self {
            authorize_url: GOOGLE_AUTHORIZE_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
        }
    }
}

/// Callback failures, each mapped to the `?error=` code the frontend understands.
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Token exchange failed: {0}")]
    Exchange(String),

    #[error("Provider returned no usable profile")]
    NoProfile,

    #[error("Could not open session: {0}")]
    Login(#[from] AppError),
}

impl OAuthError {
    pub fn redirect_code(&self) -> &'static str {
        match self {
            OAuthError::Exchange(_) => "auth_error",
            OAuthError::NoProfile => "auth_failed",
            OAuthError::Login(_) => "login_error",
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

pub struct OAuthAuthenticator {
    client: Client,
    config: GoogleOAuthConfig,
    endpoints: OAuthEndpoints,
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserStore>,
    session_ttl: Duration,
}

impl OAuthAuthenticator {
    pub fn new(
        config: GoogleOAuthConfig,
        endpoints: OAuthEndpoints,
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserStore>,
        session_ttl: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self {
            client,
            config,
            endpoints,
            sessions,
            users,
            session_ttl,
        })
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Provider consent URL carrying `state`.
    pub fn authorization_url(&self, state: &str) -> Result<String, AppError> {
        let url = Url::parse_with_params(
            &self.endpoints.authorize_url,
            &[
                ("response_type", "code"),
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("scope", SCOPES),
                ("state", state),
            ],
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid authorize URL: {e}")))?;
        Ok(url.into())
    }

    /// Exchanges `code`, upserts the user and opens a session.
    /// Returns the new session id and the signed-in identity.
    pub async fn complete_sign_in(
        &self,
        code: &str,
    ) -> Result<(String, UserIdentity), OAuthError> {
        let profile = self.fetch_profile(code).await?;
        let email = profile
            .email
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| profile.sub.clone());

        let user = self.users.upsert(&profile.sub, &email).await?;
        let identity = UserIdentity {
            id: user.id.to_string(),
            username: user.email,
        };

        let session_id = Uuid::new_v4().simple().to_string();
        self.sessions.insert(&session_id, &identity).await?;
        info!("OAuth sign-in completed for {}", identity.id);

        Ok((session_id, identity))
    }

    async fn fetch_profile(&self, code: &str) -> Result<ProfileResponse, OAuthError> {
        let token = self
            .client
            .post(&self.endpoints.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| OAuthError::Exchange(e.to_string()))?
            .json::<TokenResponse>()
            .await
            .map_err(|e| OAuthError::Exchange(e.to_string()))?;

        let response = self
            .client
            .get(&self.endpoints.userinfo_url)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| OAuthError::Exchange(e.to_string()))?;

        if !response.status().is_success() {
            warn!("Userinfo request returned {}", response.status());
            return Err(OAuthError::NoProfile);
        }

        let profile = response
            .json::<ProfileResponse>()
            .await
            .map_err(|_| OAuthError::NoProfile)?;
        if profile.sub.trim().is_empty() {
            return Err(OAuthError::NoProfile);
        }
        Ok(profile)
    }
}

#[async_trait]
impl Authenticator for OAuthAuthenticator {
    fn kind(&self) -> AuthKind {
        AuthKind::OAuth
    }

    async fn current_user(&self, headers: &HeaderMap) -> Option<UserIdentity> {
        let session_id = read_cookie(headers, SESSION_COOKIE)?;
        match self.sessions.get(&session_id).await {
            Ok(user) => user,
            Err(e) => {
                warn!("Session lookup failed: {e}");
                None
            }
        }
    }

    async fn sign_out(&self, headers: &HeaderMap) -> Result<(), AppError> {
        if let Some(session_id) = read_cookie(headers, SESSION_COOKIE) {
            self.sessions.remove(&session_id).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::auth::session::MemorySessionStore;
    use crate::auth::users::testing::MemoryUserStore;
    use axum::http::header::COOKIE;
    use axum::http::HeaderValue;
    use axum::routing::{get, post};
    use axum::{Form, Json, Router};
    use std::collections::HashMap;

    pub fn google_config() -> GoogleOAuthConfig {
        GoogleOAuthConfig {
            client_id: "client-abc".to_string(),
            client_secret: "shh".to_string(),
            redirect_url: "http://localhost:8080/api/auth/google/callback".to_string(),
            database_url: "postgres://unused".to_string(),
        }
    }

    /// Fake provider: code `good` → token `tok`, token `tok` → profile.
    pub async fn spawn_provider() -> OAuthEndpoints {
        let app = Router::new()
            .route(
                "/token",
                post(|Form(form): Form<HashMap<String, String>>| async move {
                    if form.get("code").map(String::as_str) == Some("good")
                        && form.get("client_secret").map(String::as_str) == Some("shh")
                    {
                        Ok(Json(serde_json::json!({"access_token": "tok", "token_type": "Bearer"})))
                    } else {
                        Err(axum::http::StatusCode::BAD_REQUEST)
                    }
                }),
            )
            .route(
                "/userinfo",
                get(|headers: axum::http::HeaderMap| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default();
                    if auth == "Bearer tok" {
                        Ok(Json(serde_json::json!({"sub": "g-42", "email": "grace@example.com"})))
                    } else {
                        Err(axum::http::StatusCode::UNAUTHORIZED)
                    }
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        OAuthEndpoints {
            authorize_url: format!("http://{addr}/authorize"),
            token_url: format!("http://{addr}/token"),
            userinfo_url: format!("http://{addr}/userinfo"),
        }
    }

    pub fn authenticator(endpoints: OAuthEndpoints) -> OAuthAuthenticator {
        OAuthAuthenticator::new(
            google_config(),
            endpoints,
            Arc::new(MemorySessionStore::new(Duration::from_secs(60))),
            Arc::new(MemoryUserStore::default()),
            Duration::from_secs(60),
        )
        .unwrap()
    }

    fn with_session(session_id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("sid={session_id}")).unwrap(),
        );
        headers
    }

    #[test]
    fn test_authorization_url_carries_params() {
        let auth = authenticator(OAuthEndpoints::default());
        let url = Url::parse(&auth.authorization_url("st4te").unwrap()).unwrap();
        assert_eq!(url.host_str(), Some("accounts.google.com"));
        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(params["client_id"], "client-abc");
        assert_eq!(params["state"], "st4te");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["scope"], SCOPES);
    }

    #[test]
    fn test_redirect_codes() {
        assert_eq!(OAuthError::Exchange("x".into()).redirect_code(), "auth_error");
        assert_eq!(OAuthError::NoProfile.redirect_code(), "auth_failed");
        assert_eq!(
            OAuthError::Login(AppError::Unauthorized).redirect_code(),
            "login_error"
        );
    }

    #[tokio::test]
    async fn test_sign_in_then_current_user_then_sign_out() {
        let auth = authenticator(spawn_provider().await);

        let (session_id, identity) = auth.complete_sign_in("good").await.unwrap();
        assert_eq!(identity.username, "grace@example.com");

        let headers = with_session(&session_id);
        assert_eq!(auth.current_user(&headers).await, Some(identity));

        auth.sign_out(&headers).await.unwrap();
        assert_eq!(auth.current_user(&headers).await, None);
    }

    #[tokio::test]
    async fn test_bad_code_is_exchange_error() {
        let auth = authenticator(spawn_provider().await);
        let err = auth.complete_sign_in("bad").await.unwrap_err();
        assert_eq!(err.redirect_code(), "auth_error");
    }

    #[tokio::test]
    async fn test_unknown_session_is_anonymous() {
        let auth = authenticator(OAuthEndpoints::default());
        assert_eq!(auth.current_user(&with_session("forged")).await, None);
        assert_eq!(auth.current_user(&HeaderMap::new()).await, None);
    }
}
