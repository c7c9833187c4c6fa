use crate::domain::{
    models::{attendee::{Attendee, AttendeeStats}, redemption::RedemptionRecord},
    ports::AttendeeRepository,
};
use crate::error::AppError;
use crate::infra::repositories::map_insert_error;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

pub struct PostgresAttendeeRepo {
    pool: PgPool,
}

impl PostgresAttendeeRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendeeRepository for PostgresAttendeeRepo {
    async fn create(&self, attendee: &Attendee) -> Result<Attendee, AppError> {
        sqlx::query_as::<_, Attendee>(
            "INSERT INTO attendees (id, name, email, phone, class_name, enrollment_id, meal_preference, token, qr_image_path, redeemed, redeemed_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING id, name, email, phone, class_name, enrollment_id, meal_preference, token, qr_image_path, redeemed, redeemed_at, created_at",
        )
            .bind(&attendee.id)
            .bind(&attendee.name)
            .bind(&attendee.email)
            .bind(&attendee.phone)
            .bind(&attendee.class_name)
            .bind(&attendee.enrollment_id)
            .bind(attendee.meal_preference.as_str())
            .bind(&attendee.token)
            .bind(&attendee.qr_image_path)
            .bind(attendee.redeemed)
            .bind(attendee.redeemed_at)
            .bind(attendee.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_insert_error(e, &attendee.token))
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Attendee>, AppError> {
        sqlx::query_as::<_, Attendee>(
            "SELECT id, name, email, phone, class_name, enrollment_id, meal_preference, token, qr_image_path, redeemed, redeemed_at, created_at FROM attendees WHERE token = $1",
        )
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_enrollment_id(&self, enrollment_id: &str) -> Result<Option<Attendee>, AppError> {
        sqlx::query_as::<_, Attendee>(
            "SELECT id, name, email, phone, class_name, enrollment_id, meal_preference, token, qr_image_path, redeemed, redeemed_at, created_at FROM attendees \
             WHERE LOWER(enrollment_id) = LOWER($1) ORDER BY created_at LIMIT 1",
        )
            .bind(enrollment_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn redeem(&self, token: &str, redeemed_at: DateTime<Utc>, scanner_info: &str) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let claimed: Option<String> = sqlx::query_scalar(
            "UPDATE attendees SET redeemed = TRUE, redeemed_at = $1 WHERE token = $2 AND redeemed = FALSE RETURNING id",
        )
            .bind(redeemed_at)
            .bind(token)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let Some(attendee_id) = claimed else {
            tx.rollback().await.map_err(AppError::Database)?;
            return Ok(0);
        };

        let record = RedemptionRecord::new(attendee_id, redeemed_at, scanner_info.to_string());
        sqlx::query("INSERT INTO redemptions (id, attendee_id, scanned_at, scanner_info) VALUES ($1, $2, $3, $4)")
            .bind(&record.id)
            .bind(&record.attendee_id)
            .bind(record.scanned_at)
            .bind(&record.scanner_info)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(1)
    }

    async fn list_all(&self) -> Result<Vec<Attendee>, AppError> {
        sqlx::query_as::<_, Attendee>(
            "SELECT id, name, email, phone, class_name, enrollment_id, meal_preference, token, qr_image_path, redeemed, redeemed_at, created_at FROM attendees \
             ORDER BY created_at DESC, id",
        )
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn stats(&self) -> Result<AttendeeStats, AppError> {
        sqlx::query_as::<_, AttendeeStats>(
            "SELECT \
                COUNT(*) AS total_users, \
                COALESCE(SUM(CASE WHEN redeemed THEN 1 ELSE 0 END), 0) AS scanned_count, \
                COALESCE(SUM(CASE WHEN meal_preference = 'veg' THEN 1 ELSE 0 END), 0) AS veg_count, \
                COALESCE(SUM(CASE WHEN meal_preference = 'non-veg' THEN 1 ELSE 0 END), 0) AS nonveg_count, \
                COALESCE(SUM(CASE WHEN meal_preference = 'veg' AND redeemed THEN 1 ELSE 0 END), 0) AS veg_scanned, \
                COALESCE(SUM(CASE WHEN meal_preference = 'non-veg' AND redeemed THEN 1 ELSE 0 END), 0) AS nonveg_scanned \
             FROM attendees",
        )
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn count_redemptions(&self) -> Result<i64, AppError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM redemptions")
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn clear_all(&self) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        sqlx::query("DELETE FROM redemptions")
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        sqlx::query("DELETE FROM attendees")
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)
    }
}
