use std::env;
use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub qr_code_dir: String,
    pub mail_service_url: String,
    pub mail_service_token: String,
    pub event_name: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());

        Ok(Self {
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://food_tokens.db?mode=rwc".to_string()),
            port: port.parse().map_err(|_| AppError::Validation(format!("PORT must be a number, got '{}'", port)))?,
            qr_code_dir: env::var("QR_CODE_DIR").unwrap_or_else(|_| "qr-codes".to_string()),
            mail_service_url: env::var("MAIL_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8000/api/v1/send".to_string()),
            mail_service_token: env::var("MAIL_SERVICE_TOKEN").unwrap_or_default(),
            event_name: env::var("EVENT_NAME").unwrap_or_else(|_| "Food Token".to_string()),
        })
    }
}
