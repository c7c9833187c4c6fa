use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;
use tera::Tera;

use crate::config::Config;
use crate::domain::ports::AttendeeRepository;
use crate::domain::services::distribution_service::QR_EMAIL_TEMPLATE;
use crate::error::AppError;
use crate::state::AppState;
use crate::infra::codes::fs_code_store::FsCodeImageStore;
use crate::infra::email::http_email_service::HttpEmailService;
use crate::infra::repositories::{
    postgres_attendee_repo::PostgresAttendeeRepo,
    sqlite_attendee_repo::SqliteAttendeeRepo,
};

pub async fn bootstrap_state(config: &Config) -> Result<AppState, AppError> {
    let database_url = &config.database_url;
    let email_service = Arc::new(HttpEmailService::new(
        config.mail_service_url.clone(),
        config.mail_service_token.clone(),
    ));
    let code_store = Arc::new(FsCodeImageStore::new(&config.qr_code_dir));

    let mut tera = Tera::default();
    tera.add_raw_template(QR_EMAIL_TEMPLATE, include_str!("../../templates/qr_code_email.html"))
        .map_err(|e| AppError::InternalWithMsg(format!("Failed to load email template: {}", e)))?;
    let templates = Arc::new(tera);

    let attendee_repo: Arc<dyn AttendeeRepository> =
        if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
            info!("Initializing PostgreSQL connection...");

            let opts = PgConnectOptions::from_str(database_url)?
                .log_statements(LevelFilter::Debug)
                .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect_with(opts)
                .await?;

            run_postgres_migrations(&pool).await?;
            Arc::new(PostgresAttendeeRepo::new(pool))
        } else {
            info!("Initializing SQLite connection with WAL Mode...");

            let opts = SqliteConnectOptions::from_str(database_url)?
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .busy_timeout(Duration::from_secs(5))
                .log_statements(LevelFilter::Debug)
                .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

            let pool = SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(opts)
                .await?;

            run_sqlite_migrations(&pool).await?;
            Arc::new(SqliteAttendeeRepo::new(pool))
        };

    Ok(AppState::new(
        config.clone(),
        attendee_repo,
        code_store,
        email_service,
        templates,
    ))
}

async fn run_postgres_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .map_err(|e| AppError::InternalWithMsg(format!("Failed to run Postgres migrations: {}", e)))
}

pub async fn run_sqlite_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .map_err(|e| AppError::InternalWithMsg(format!("Failed to run SQLite migrations: {}", e)))
}
