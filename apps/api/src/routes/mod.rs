pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::errors::AppError;
use crate::plan::handlers as plan;
use crate::state::AppState;
use crate::upload::handlers as upload;

async fn route_not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/auth/google", get(auth::handle_google_sign_in))
        .route(
            "/api/auth/google/callback",
            get(auth::handle_google_callback),
        )
        .route("/api/auth/signout", post(auth::handle_sign_out))
        .route("/api/auth/me", get(auth::handle_me))
        // Analysis
        .route(
            "/api/upload",
            post(upload::handle_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/plan", get(plan::handle_get_plan))
        .fallback(route_not_found)
        .with_state(state)
}
