use std::collections::HashMap;
use std::sync::Arc;
use csv::{ReaderBuilder, Trim};
use tracing::{debug, info};
use crate::domain::{
    models::attendee::{Attendee, MealPreference, NewAttendee},
    ports::{AttendeeRepository, CodeImageStore},
};
use crate::error::AppError;

const NAME_COLUMNS: &[&str] = &["name", "full_name", "participant_name", "your_name", "student_name", "enter_your_name"];
const EMAIL_COLUMNS: &[&str] = &["email", "email_address", "email_id", "enter_your_college_mail_id"];
const PHONE_COLUMNS: &[&str] = &["phone", "mobile", "contact", "phone_number"];
const MEAL_COLUMNS: &[&str] = &["food_preference", "food_choice", "preference", "veg_non_veg", "what_kind_of_food_do_you_prefer"];
const ENROLLMENT_COLUMNS: &[&str] = &["usn", "enrollment_id", "student_id", "enter_your_usn"];
const CLASS_COLUMNS: &[&str] = &["class", "class_name", "section"];

/// Lower-cases, trims and joins whitespace runs with `_`.
pub fn normalize_header(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Derives an enrollment id from the local part of a college mail address,
/// e.g. `4sf22cd044@college.edu` becomes `4SF22CD044`.
pub fn enrollment_id_from_email(email: &str) -> Option<String> {
    let local = email.split('@').next()?;
    let candidate: String = local
        .to_uppercase()
        .chars()
        .filter(|c| !matches!(c, '.' | '-' | '_'))
        .collect();

    let has_digit = candidate.chars().any(|c| c.is_ascii_digit());
    let has_alpha = candidate.chars().any(|c| c.is_ascii_alphabetic());

    (candidate.len() >= 6 && has_digit && has_alpha).then_some(candidate)
}

fn pick(row: &HashMap<String, String>, columns: &[&str]) -> Option<String> {
    columns
        .iter()
        .filter_map(|c| row.get(*c))
        .find(|v| !v.is_empty())
        .cloned()
}

/// Parses a roster into attendee fields. Rows without a name are skipped.
pub fn parse_roster(data: &[u8]) -> Result<Vec<NewAttendee>, AppError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::Validation(format!("Unreadable CSV header: {}", e)))?
        .iter()
        .map(normalize_header)
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(AppError::Validation("CSV file has no header row".into()));
    }

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| AppError::Validation(format!("Malformed CSV record {}: {}", line + 1, e)))?;

        let row: HashMap<String, String> = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();

        let Some(name) = pick(&row, NAME_COLUMNS) else {
            debug!("Skipping roster row {} without a name", line + 1);
            continue;
        };

        let email = pick(&row, EMAIL_COLUMNS);
        let enrollment_id = pick(&row, ENROLLMENT_COLUMNS)
            .or_else(|| email.as_deref().and_then(enrollment_id_from_email));
        let meal_preference = MealPreference::classify(&pick(&row, MEAL_COLUMNS).unwrap_or_default());

        rows.push(NewAttendee {
            name,
            email,
            phone: pick(&row, PHONE_COLUMNS),
            class_name: pick(&row, CLASS_COLUMNS),
            enrollment_id,
            meal_preference: Some(meal_preference),
        });
    }

    Ok(rows)
}

pub struct IngestionService {
    repo: Arc<dyn AttendeeRepository>,
    codes: Arc<dyn CodeImageStore>,
}

impl IngestionService {
    pub fn new(repo: Arc<dyn AttendeeRepository>, codes: Arc<dyn CodeImageStore>) -> Self {
        Self { repo, codes }
    }

    /// Issues one token per named row. The first failed insert aborts the import.
    pub async fn ingest(&self, data: &[u8]) -> Result<Vec<Attendee>, AppError> {
        let rows = parse_roster(data)?;
        let mut created = Vec::with_capacity(rows.len());

        for fields in rows {
            let mut attendee = Attendee::new(fields);
            attendee.qr_image_path = Some(self.codes.image_path(&attendee.token));
            created.push(self.repo.create(&attendee).await?);
        }

        info!("Imported {} attendees from roster", created.len());
        Ok(created)
    }
}
