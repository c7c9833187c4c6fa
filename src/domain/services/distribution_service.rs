use std::sync::Arc;
use serde::Serialize;
use tera::{Context, Tera};
use tracing::{info, warn};
use crate::domain::{
    models::attendee::{Attendee, MealPreference},
    ports::{AttendeeRepository, CodeImageStore, EmailService},
};
use crate::error::AppError;

pub const QR_EMAIL_TEMPLATE: &str = "qr_code_email.html";

#[derive(Debug, Serialize, Clone)]
pub struct GeneratedCode {
    pub name: String,
    pub token: String,
    pub meal_preference: MealPreference,
    pub qr_path: String,
}

#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct SendSummary {
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Produces QR code assets for attendees and delivers them by email.
pub struct DistributionService {
    repo: Arc<dyn AttendeeRepository>,
    codes: Arc<dyn CodeImageStore>,
    email: Arc<dyn EmailService>,
    event_name: String,
}

impl DistributionService {
    pub fn new(
        repo: Arc<dyn AttendeeRepository>,
        codes: Arc<dyn CodeImageStore>,
        email: Arc<dyn EmailService>,
        event_name: String,
    ) -> Self {
        Self { repo, codes, email, event_name }
    }

    /// Writes an image for every attendee that has not redeemed yet.
    pub async fn generate_codes(&self) -> Result<Vec<GeneratedCode>, AppError> {
        let attendees = self.repo.list_all().await?;
        let mut generated = Vec::new();

        for attendee in attendees.iter().filter(|a| !a.redeemed) {
            let qr_path = self.codes.generate(&attendee.token, &attendee.qr_payload()).await?;
            generated.push(GeneratedCode {
                name: attendee.name.clone(),
                token: attendee.token.clone(),
                meal_preference: attendee.meal_preference,
                qr_path,
            });
        }

        info!("Generated {} QR codes", generated.len());
        Ok(generated)
    }

    /// Emails each unredeemed attendee with an address their QR code.
    /// Delivery failures are counted and logged; they do not stop the batch.
    pub async fn send_codes(&self, templates: &Tera) -> Result<SendSummary, AppError> {
        let attendees = self.repo.list_all().await?;
        let mut summary = SendSummary::default();
        let subject = format!("Your Food Token QR Code - {}", self.event_name);

        for attendee in attendees.iter().filter(|a| !a.redeemed) {
            let Some(recipient) = attendee.email.as_deref().map(str::trim).filter(|e| e.contains('@')) else {
                summary.skipped += 1;
                continue;
            };

            let html_body = self.render_body(templates, attendee)?;
            let image = self.codes.render(&attendee.qr_payload()).await?;
            let attachment_name = attachment_name(attendee);

            match self.email.send(recipient, &subject, &html_body, Some(attachment_name.as_str()), Some(image.as_slice())).await {
                Ok(()) => summary.sent += 1,
                Err(e) => {
                    warn!(attendee_id = %attendee.id, "Failed to email QR code: {}", e);
                    summary.failed += 1;
                }
            }
        }

        info!(
            sent = summary.sent,
            skipped = summary.skipped,
            failed = summary.failed,
            "QR code email run finished"
        );
        Ok(summary)
    }

    fn render_body(&self, templates: &Tera, attendee: &Attendee) -> Result<String, AppError> {
        let mut context = Context::new();
        context.insert("name", &attendee.name);
        context.insert("enrollment_id", &attendee.enrollment_id.clone().unwrap_or_default());
        context.insert("class_name", &attendee.class_name.clone().unwrap_or_default());
        context.insert("meal_preference", attendee.meal_preference.as_str());
        context.insert("event_name", &self.event_name);

        templates
            .render(QR_EMAIL_TEMPLATE, &context)
            .map_err(|e| AppError::InternalWithMsg(format!("Failed to render email template: {}", e)))
    }
}

fn attachment_name(attendee: &Attendee) -> String {
    let safe_name: String = attendee
        .name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .trim()
        .replace(' ', "_");

    format!("{}_{}.png", safe_name, attendee.token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::attendee::NewAttendee;

    #[test]
    fn test_attachment_name_is_filesystem_safe() {
        let attendee = Attendee::new(NewAttendee {
            name: " Asha K. Rao/ ".into(),
            ..Default::default()
        });

        assert_eq!(attachment_name(&attendee), format!("Asha_K_Rao_{}.png", attendee.token));
    }
}
