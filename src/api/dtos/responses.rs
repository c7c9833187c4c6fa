use chrono::{DateTime, Utc};
use serde::Serialize;
use crate::domain::models::attendee::{Attendee, MealPreference};
use crate::domain::services::{distribution_service::GeneratedCode, redemption_service::MatchedBy};

#[derive(Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub count: usize,
    pub users: Vec<Attendee>,
}

#[derive(Serialize)]
pub struct GenerateCodesResponse {
    pub message: String,
    pub count: usize,
    pub codes: Vec<GeneratedCode>,
}

#[derive(Serialize)]
pub struct SendCodesResponse {
    pub message: String,
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Serialize)]
pub struct ScannedAttendee {
    pub name: String,
    pub meal_preference: MealPreference,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub enrollment_id: Option<String>,
    pub class_name: Option<String>,
    pub scanned_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct ScanResponse {
    pub success: bool,
    pub message: String,
    pub matched_by: MatchedBy,
    pub user: ScannedAttendee,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}
