pub mod sqlite_attendee_repo;
pub mod postgres_attendee_repo;

use crate::error::AppError;

/// Unique violations on insert can only come from the token column, so they
/// surface as a conflict instead of a generic database failure.
pub(crate) fn map_insert_error(err: sqlx::Error, token: &str) -> AppError {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(format!("Token {} has already been issued", token))
        }
        other => AppError::Database(other),
    }
}
