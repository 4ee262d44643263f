use axum::{extract::State, Json};
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub plan: String,
    pub remaining: u32,
}

/// GET /api/plan
pub async fn handle_get_plan(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<PlanResponse>, AppError> {
    let usage = state.quota.usage(&user.id).await?;
    Ok(Json(PlanResponse {
        remaining: usage.remaining(),
        plan: usage.tier,
    }))
}
