use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use crate::state::AppState;
use crate::api::dtos::responses::{GenerateCodesResponse, SendCodesResponse};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

const ARCHIVE_NAME: &str = "qr-codes.zip";

pub async fn generate_codes(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let codes = state.distribution_service.generate_codes().await?;

    Ok(Json(GenerateCodesResponse {
        message: "QR codes generated successfully".into(),
        count: codes.len(),
        codes,
    }))
}

pub async fn download_codes(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let archive = state.code_store.archive().await?;
    info!("Serving QR code archive ({} bytes)", archive.len());

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", ARCHIVE_NAME)),
        ],
        archive,
    ))
}

pub async fn send_codes(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let summary = state.distribution_service.send_codes(&state.templates).await?;

    Ok(Json(SendCodesResponse {
        message: "QR code emails processed".into(),
        sent: summary.sent,
        skipped: summary.skipped,
        failed: summary.failed,
    }))
}
