use crate::domain::models::attendee::{Attendee, AttendeeStats};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait AttendeeRepository: Send + Sync {
    /// Inserts a new attendee. A duplicate token is rejected with `AppError::Conflict`.
    async fn create(&self, attendee: &Attendee) -> Result<Attendee, AppError>;
    async fn find_by_token(&self, token: &str) -> Result<Option<Attendee>, AppError>;
    /// Case-insensitive match on the enrollment id.
    async fn find_by_enrollment_id(&self, enrollment_id: &str) -> Result<Option<Attendee>, AppError>;
    /// Flips `redeemed` with a single conditional update and, when a row changed,
    /// records the scan in the audit log within the same transaction.
    /// Returns the number of attendee rows affected; zero is never a success.
    async fn redeem(&self, token: &str, redeemed_at: DateTime<Utc>, scanner_info: &str) -> Result<u64, AppError>;
    async fn list_all(&self) -> Result<Vec<Attendee>, AppError>;
    async fn stats(&self) -> Result<AttendeeStats, AppError>;
    async fn count_redemptions(&self) -> Result<i64, AppError>;
    async fn clear_all(&self) -> Result<(), AppError>;
}

#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str, attachment_name: Option<&str>, attachment_data: Option<&[u8]>) -> Result<(), AppError>;
}

/// Storage for rendered QR code images.
#[async_trait]
pub trait CodeImageStore: Send + Sync {
    /// Where the image for `token` lives (or will live) once generated.
    fn image_path(&self, token: &str) -> String;
    /// Renders the QR code for `payload` as PNG bytes without persisting it.
    async fn render(&self, payload: &str) -> Result<Vec<u8>, AppError>;
    /// Renders and persists the image for `token`, returning its path.
    async fn generate(&self, token: &str, payload: &str) -> Result<String, AppError>;
    /// Packs every stored image into a single ZIP archive.
    async fn archive(&self) -> Result<Vec<u8>, AppError>;
    /// Deletes every stored image, returning how many were removed.
    async fn purge(&self) -> Result<usize, AppError>;
}
