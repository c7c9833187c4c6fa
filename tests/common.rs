use food_token_backend::{
    api::router::create_router,
    config::Config,
    domain::ports::EmailService,
    domain::services::distribution_service::QR_EMAIL_TEMPLATE,
    error::AppError,
    infra::{codes::fs_code_store::FsCodeImageStore, repositories::sqlite_attendee_repo::SqliteAttendeeRepo},
    state::AppState,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions}, Pool, Sqlite};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    Router,
};
use async_trait::async_trait;
use tera::Tera;
use tower::ServiceExt;
use serde_json::{json, Value};

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct SentMail {
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
    pub attachment_name: Option<String>,
    pub attachment_len: usize,
}

/// Records every message and rejects recipients listed in `fail_for`.
#[derive(Default)]
pub struct MockEmailService {
    pub sent: Mutex<Vec<SentMail>>,
    pub fail_for: Mutex<Vec<String>>,
}

#[async_trait]
impl EmailService for MockEmailService {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        html_body: &str,
        attachment_name: Option<&str>,
        attachment_data: Option<&[u8]>
    ) -> Result<(), AppError> {
        if self.fail_for.lock().unwrap().iter().any(|r| r == recipient) {
            return Err(AppError::InternalWithMsg("relay unavailable".into()));
        }

        self.sent.lock().unwrap().push(SentMail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
            attachment_name: attachment_name.map(str::to_string),
            attachment_len: attachment_data.map(|d| d.len()).unwrap_or_default(),
        });
        Ok(())
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub qr_dir: String,
    pub state: Arc<AppState>,
    pub mailer: Arc<MockEmailService>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let id = Uuid::new_v4();
        let db_filename = format!("test_{}.db", id);
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);
        let qr_dir = format!("test_qr_{}", id);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let mut tera = Tera::default();
        tera.add_raw_template(QR_EMAIL_TEMPLATE, "<html>Token for {{ name }} ({{ meal_preference }}) at {{ event_name }}</html>").unwrap();
        let templates = Arc::new(tera);

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            qr_code_dir: qr_dir.clone(),
            mail_service_url: "http://localhost".to_string(),
            mail_service_token: "token".to_string(),
            event_name: "Tech Fest".to_string(),
        };

        let mailer = Arc::new(MockEmailService::default());

        let state = Arc::new(AppState::new(
            config,
            Arc::new(SqliteAttendeeRepo::new(pool.clone())),
            Arc::new(FsCodeImageStore::new(&qr_dir)),
            mailer.clone(),
            templates,
        ));

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            qr_dir,
            state,
            mailer,
        }
    }

    pub async fn upload_csv(&self, csv: &str) -> Response {
        let boundary = "food-token-test-boundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"csvFile\"; filename=\"roster.csv\"\r\nContent-Type: text/csv\r\n\r\n{csv}\r\n--{b}--\r\n",
            b = boundary,
            csv = csv,
        );

        self.router.clone().oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
                .body(Body::from(body))
                .unwrap()
        ).await.unwrap()
    }

    /// Uploads a roster and returns the created users from the response body.
    pub async fn seed(&self, csv: &str) -> Vec<Value> {
        let response = self.upload_csv(csv).await;
        assert!(response.status().is_success(), "Seeding failed: {}", response.status());
        let body = parse_body(response).await;
        body["users"].as_array().cloned().unwrap_or_default()
    }

    pub async fn scan(&self, qr_data: &str) -> Response {
        self.router.clone().oneshot(
            Request::builder()
                .method("POST")
                .uri("/scan")
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-forwarded-for", "10.0.0.7")
                .body(Body::from(json!({ "qr_data": qr_data }).to_string()))
                .unwrap()
        ).await.unwrap()
    }

    pub async fn request(&self, method: &str, uri: &str) -> Response {
        self.router.clone().oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap()
        ).await.unwrap()
    }

    pub async fn get_json(&self, uri: &str) -> Value {
        parse_body(self.request("GET", uri).await).await
    }
}

#[allow(dead_code)]
pub async fn parse_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
        let _ = std::fs::remove_dir_all(&self.qr_dir);
    }
}
