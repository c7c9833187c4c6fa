use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Audit entry written alongside a successful redemption.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct RedemptionRecord {
    pub id: String,
    pub attendee_id: String,
    pub scanned_at: DateTime<Utc>,
    pub scanner_info: String,
}

impl RedemptionRecord {
    pub fn new(attendee_id: String, scanned_at: DateTime<Utc>, scanner_info: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            attendee_id,
            scanned_at,
            scanner_info,
        }
    }
}
