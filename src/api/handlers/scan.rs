use axum::{extract::State, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::{requests::ScanRequest, responses::{ScanResponse, ScannedAttendee}};
use crate::api::extractors::scanner::ScannerInfo;
use crate::domain::services::redemption_service::MatchedBy;
use crate::error::AppError;
use std::sync::Arc;

pub async fn scan(
    State(state): State<Arc<AppState>>,
    ScannerInfo(scanner_info): ScannerInfo,
    Json(payload): Json<ScanRequest>,
) -> Result<impl IntoResponse, AppError> {
    let qr_data = payload.qr_data
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| AppError::Validation("No QR data provided".into()))?;

    let outcome = state.redemption_service.redeem_scan(&qr_data, &scanner_info).await?;
    let attendee = outcome.attendee;

    let message = match outcome.matched_by {
        MatchedBy::EnrollmentId => "Enrollment id validated successfully",
        MatchedBy::Token => "Token scanned successfully",
    };

    Ok(Json(ScanResponse {
        success: true,
        message: message.into(),
        matched_by: outcome.matched_by,
        user: ScannedAttendee {
            name: attendee.name,
            meal_preference: attendee.meal_preference,
            email: attendee.email,
            phone: attendee.phone,
            enrollment_id: attendee.enrollment_id,
            class_name: attendee.class_name,
            scanned_at: outcome.redeemed_at,
        },
    }))
}
