//! Axum route handlers for sign-in, sign-out and identity.

use axum::{
    extract::{Query, State},
    http::{header::SET_COOKIE, HeaderMap},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::auth::cookies::{clear_cookie, read_cookie, set_cookie, OAUTH_STATE_COOKIE, SESSION_COOKIE};
use crate::auth::{AuthKind, CurrentUser, UserIdentity};
use crate::errors::AppError;
use crate::state::AppState;

const OAUTH_STATE_TTL_SECS: u64 = 10 * 60;

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// GET /api/auth/google
///
/// Starts the OAuth flow. In hosted mode the frontend signs in through the provider's SDK.
pub async fn handle_google_sign_in(State(state): State<AppState>) -> Result<Response, AppError> {
    let Some(oauth) = state.oauth.as_ref() else {
        return Err(match state.authenticator.kind() {
            AuthKind::Hosted => AppError::Validation("Use hosted sign-in".to_string()),
            AuthKind::OAuth => {
                AppError::Internal(anyhow::anyhow!("Google OAuth not configured"))
            }
        });
    };

    let csrf = Uuid::new_v4().simple().to_string();
    let url = oauth.authorization_url(&csrf)?;

    let mut response = Redirect::to(&url).into_response();
    response.headers_mut().append(
        SET_COOKIE,
        set_cookie(OAUTH_STATE_COOKIE, &csrf, OAUTH_STATE_TTL_SECS),
    );
    Ok(response)
}

/// GET /api/auth/google/callback
///
/// Always answers with a redirect to the frontend: `/dashboard` on success,
/// `/?error=<code>` otherwise.
pub async fn handle_google_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Result<Response, AppError> {
    let oauth = state
        .oauth
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Google OAuth not configured".to_string()))?;
    let frontend = &state.config.frontend_url;

    let failure = |code: &str| {
        let mut response = Redirect::to(&format!("{frontend}/?error={code}")).into_response();
        response
            .headers_mut()
            .append(SET_COOKIE, clear_cookie(OAUTH_STATE_COOKIE));
        response
    };

    if let Some(error) = params.error.as_deref() {
        warn!("Provider denied sign-in: {error}");
        return Ok(failure("auth_failed"));
    }

    let expected = read_cookie(&headers, OAUTH_STATE_COOKIE);
    let state_ok = matches!((&expected, &params.state), (Some(e), Some(s)) if e == s);
    let Some(code) = params.code.as_deref().filter(|_| state_ok) else {
        warn!("OAuth callback rejected: missing code or state mismatch");
        return Ok(failure("auth_failed"));
    };

    match oauth.complete_sign_in(code).await {
        Ok((session_id, _identity)) => {
            let mut response = Redirect::to(&format!("{frontend}/dashboard")).into_response();
            let headers = response.headers_mut();
            headers.append(
                SET_COOKIE,
                set_cookie(SESSION_COOKIE, &session_id, oauth.session_ttl().as_secs()),
            );
            headers.append(SET_COOKIE, clear_cookie(OAUTH_STATE_COOKIE));
            Ok(response)
        }
        Err(e) => {
            warn!("Google auth error: {e}");
            Ok(failure(e.redirect_code()))
        }
    }
}

/// POST /api/auth/signout
pub async fn handle_sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    state.authenticator.sign_out(&headers).await?;
    let mut response = Json(json!({ "ok": true })).into_response();
    response
        .headers_mut()
        .append(SET_COOKIE, clear_cookie(SESSION_COOKIE));
    Ok(response)
}

/// GET /api/auth/me
pub async fn handle_me(CurrentUser(user): CurrentUser) -> Json<UserIdentity> {
    Json(user)
}

