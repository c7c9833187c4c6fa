use axum::{extract::{Multipart, State}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::responses::{MessageResponse, UploadResponse};
use crate::error::AppError;
use std::sync::Arc;
use tracing::{info, warn};

const ROSTER_FIELD: &str = "csvFile";

pub async fn upload_roster(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut roster = None;

    while let Some(field) = multipart.next_field().await
        .map_err(|e| AppError::Validation(format!("Malformed upload: {}", e)))?
    {
        let is_roster = field.name() == Some(ROSTER_FIELD) || field.file_name().is_some();
        if is_roster {
            let bytes = field.bytes().await
                .map_err(|e| AppError::Validation(format!("Failed to read uploaded file: {}", e)))?;
            roster = Some(bytes);
            break;
        }
    }

    let roster = roster.ok_or_else(|| AppError::Validation("No file uploaded".into()))?;
    let users = state.ingestion_service.ingest(&roster).await?;

    info!("Roster upload created {} attendees", users.len());

    Ok(Json(UploadResponse {
        message: "CSV processed successfully".into(),
        count: users.len(),
        users,
    }))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let users = state.attendee_repo.list_all().await?;
    Ok(Json(users))
}

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let stats = state.attendee_repo.stats().await?;
    Ok(Json(stats))
}

pub async fn clear_data(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    state.attendee_repo.clear_all().await?;
    let removed = state.code_store.purge().await?;

    warn!("All attendee data cleared ({} images removed)", removed);

    Ok(Json(MessageResponse {
        message: "All data cleared successfully".into(),
    }))
}
