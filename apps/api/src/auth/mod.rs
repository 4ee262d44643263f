// Authentication
// One `Authenticator` capability, two interchangeable backends chosen at startup:
// a hosted identity provider (bearer token) or a manual OAuth 2.0 code flow (session cookie).
// Nothing here touches the skill engine.

pub mod cookies;
pub mod handlers;
pub mod hosted;
pub mod oauth;
pub mod session;
pub mod users;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::state::AppState;

/// The signed-in user as seen by route handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthKind {
    Hosted,
    OAuth,
}

/// Resolves the current user from request headers.
///
/// Carried in `AppState` as `Arc<dyn Authenticator>`.
#[async_trait]
pub trait Authenticator: Send + Sync {
    fn kind(&self) -> AuthKind;

    /// `None` when the request is anonymous or its credentials do not check out.
    async fn current_user(&self, headers: &HeaderMap) -> Option<UserIdentity>;

    /// Ends whatever server-side session backs `headers`. No-op by default.
    async fn sign_out(&self, _headers: &HeaderMap) -> Result<(), AppError> {
        Ok(())
    }
}

/// Extractor that rejects with 401 unless the `Authenticator` resolves a user.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserIdentity);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        state
            .authenticator
            .current_user(&parts.headers)
            .await
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized)
    }
}
