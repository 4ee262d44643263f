//! Hosted identity provider backend.
//!
//! The provider's frontend SDK hands the browser a session token (bearer header or
//! `__session` cookie). Each request's token is verified by the provider's backend
//! API, authenticated with our secret key.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::cookies::{read_cookie, HOSTED_SESSION_COOKIE};
use crate::auth::{AuthKind, Authenticator, UserIdentity};
use crate::config::HostedAuthConfig;

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    token: &'a str,
}

/// Provider's view of a verified session.
#[derive(Debug, Deserialize)]
pub struct ProviderUser {
    #[serde(alias = "user_id", alias = "id")]
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl From<ProviderUser> for UserIdentity {
    fn from(user: ProviderUser) -> Self {
        let username = user
            .username
            .or(user.email)
            .unwrap_or_else(|| user.sub.clone());
        UserIdentity {
            id: user.sub,
            username,
        }
    }
}

pub struct HostedAuthenticator {
    client: Client,
    config: HostedAuthConfig,
}

impl HostedAuthenticator {
    pub fn new(config: HostedAuthConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self { client, config })
    }

    async fn verify(&self, token: &str) -> Result<Option<ProviderUser>, reqwest::Error> {
        let response = self
            .client
            .post(&self.config.verify_url)
            .bearer_auth(&self.config.secret_key)
            .json(&VerifyRequest { token })
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 404 {
            debug!("Hosted provider rejected session token ({status})");
            return Ok(None);
        }

        let user = response.error_for_status()?.json::<ProviderUser>().await?;
        Ok(Some(user))
    }
}

/// Bearer token from `Authorization`, falling back to the provider's session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| read_cookie(headers, HOSTED_SESSION_COOKIE))
}

#[async_trait]
impl Authenticator for HostedAuthenticator {
    fn kind(&self) -> AuthKind {
        AuthKind::Hosted
    }

    async fn current_user(&self, headers: &HeaderMap) -> Option<UserIdentity> {
        let token = session_token(headers)?;
        match self.verify(&token).await {
            Ok(user) => user.map(UserIdentity::from),
            Err(e) => {
                warn!("Hosted provider verification failed: {e}");
                None
            }
        }
    }
}
