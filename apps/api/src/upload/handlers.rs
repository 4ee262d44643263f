use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{info, warn};

use crate::auth::{CurrentUser, UserIdentity};
use crate::errors::AppError;
use crate::skills::ExtractionResult;
use crate::state::AppState;
use crate::upload::pdf::is_pdf_mime;

const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    #[serde(flatten)]
    pub result: ExtractionResult,
    /// Length in UTF-16 code units, the unit browser clients measure strings in.
    pub text_length: usize,
}

/// POST /api/upload
///
/// Multipart body with a single PDF under `file`. A plan slot is reserved before
/// the body is read and given back if the upload is rejected, so only successful
/// analyses count against the plan.
pub async fn handle_upload(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let Some(usage) = state.quota.reserve_upload(&user.id).await? else {
        info!("Upload refused for {}: plan limit reached", user.id);
        return Err(AppError::PaymentRequired("Plan limit reached".to_string()));
    };

    match analyse_upload(&state, &user, multipart).await {
        Ok(response) => {
            info!(
                "Analysed upload for {}: {} detected, {} suggested, {} uploads left",
                user.id,
                response.result.extracted_skills.len(),
                response.result.suggested_skills.len(),
                usage.remaining()
            );
            Ok(Json(response))
        }
        Err(e) => {
            if let Err(release_err) = state.quota.release_upload(&user.id).await {
                warn!("Failed to release plan slot for {}: {release_err}", user.id);
            }
            Err(e)
        }
    }
}

async fn analyse_upload(
    state: &AppState,
    user: &UserIdentity,
    mut multipart: Multipart,
) -> Result<UploadResponse, AppError> {
    let mut upload: Option<(Option<String>, Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid file: {e}")))?;
        upload = Some((content_type, data));
        break;
    }

    let Some((content_type, data)) = upload else {
        return Err(AppError::Validation("No file uploaded".to_string()));
    };
    if !is_pdf_mime(content_type.as_deref()) {
        return Err(AppError::Validation("Only PDF supported".to_string()));
    }

    let extractor = state.text_extractor.clone();
    let text = tokio::task::spawn_blocking(move || extractor.extract_text(&data))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Text extraction task failed: {e}")))?
        .map_err(|e| {
            warn!("Rejected upload from {}: {e}", user.id);
            AppError::UnprocessableEntity(e.to_string())
        })?;

    let text_length = text_length(&text);
    let result = state.engine.extract(&text);
    Ok(UploadResponse {
        result,
        text_length,
    })
}

fn text_length(text: &str) -> usize {
    text.encode_utf16().count()
}
