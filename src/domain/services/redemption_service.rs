use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use crate::domain::{
    models::attendee::{current_timestamp, Attendee},
    ports::AttendeeRepository,
};
use crate::error::AppError;

const ENROLLMENT_ID_MIN_LEN: usize = 6;
const ENROLLMENT_ID_MAX_LEN: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedBy {
    Token,
    EnrollmentId,
}

#[derive(Debug, Clone)]
pub struct RedemptionOutcome {
    pub attendee: Attendee,
    pub redeemed_at: DateTime<Utc>,
    pub matched_by: MatchedBy,
}

#[derive(Deserialize)]
struct ScannedPayload {
    token: String,
}

/// Extracts the token from a structured QR payload such as
/// `{"token": "...", "name": "...", "type": "food-token"}`.
pub fn parse_token_payload(payload: &str) -> Option<String> {
    serde_json::from_str::<ScannedPayload>(payload.trim())
        .ok()
        .map(|p| p.token)
}

/// Normalizes manual input and returns it if it has the shape of an enrollment id.
pub fn enrollment_candidate(payload: &str) -> Option<String> {
    let normalized = payload.trim().to_uppercase();
    let well_formed = normalized.chars().all(|c| c.is_ascii_alphanumeric())
        && (ENROLLMENT_ID_MIN_LEN..=ENROLLMENT_ID_MAX_LEN).contains(&normalized.len());

    well_formed.then_some(normalized)
}

pub struct RedemptionService {
    repo: Arc<dyn AttendeeRepository>,
}

impl RedemptionService {
    pub fn new(repo: Arc<dyn AttendeeRepository>) -> Self {
        Self { repo }
    }

    /// Resolves a scanned payload: structured QR data first, then an enrollment id,
    /// then the raw input as a token.
    pub async fn resolve(&self, payload: &str) -> Result<(Attendee, MatchedBy), AppError> {
        if let Some(token) = parse_token_payload(payload) {
            return self.repo.find_by_token(&token).await?
                .map(|a| (a, MatchedBy::Token))
                .ok_or_else(|| AppError::NotFound("Invalid token".into()));
        }

        let raw = payload.trim();
        let mut tried_enrollment = false;

        if let Some(enrollment_id) = enrollment_candidate(raw) {
            if let Some(found) = self.repo.find_by_enrollment_id(&enrollment_id).await? {
                return Ok((found, MatchedBy::EnrollmentId));
            }
            tried_enrollment = true;
        }

        // Tokens are case-sensitive, so the fallback uses the input as typed.
        match self.repo.find_by_token(raw).await? {
            Some(found) => Ok((found, MatchedBy::Token)),
            None if tried_enrollment => Err(AppError::NotFound("Enrollment id not found".into())),
            None => Err(AppError::NotFound("Invalid token".into())),
        }
    }

    /// Performs the one-way claim for an already resolved attendee.
    pub async fn claim(&self, attendee: &Attendee, scanner_info: &str) -> Result<DateTime<Utc>, AppError> {
        let redeemed_at = current_timestamp();
        let affected = self.repo.redeem(&attendee.token, redeemed_at, scanner_info).await?;

        if affected == 1 {
            return Ok(redeemed_at);
        }

        let current = self.repo.find_by_token(&attendee.token).await?
            .ok_or_else(|| AppError::NotFound("Invalid token".into()))?;

        match (current.redeemed, current.redeemed_at) {
            (true, Some(prior)) => {
                warn!(attendee_id = %current.id, "Rejected second redemption attempt");
                Err(AppError::AlreadyRedeemed {
                    redeemed_at: prior,
                    attendee: current.public_view(),
                })
            }
            (true, None) => Err(AppError::InternalWithMsg(
                format!("Attendee {} is redeemed without a timestamp", current.id),
            )),
            (false, _) => Err(AppError::InternalWithMsg(
                format!("Redemption of attendee {} affected {} rows", current.id, affected),
            )),
        }
    }

    pub async fn redeem_scan(&self, payload: &str, scanner_info: &str) -> Result<RedemptionOutcome, AppError> {
        let (attendee, matched_by) = self.resolve(payload).await?;
        let redeemed_at = self.claim(&attendee, scanner_info).await?;

        info!(attendee_id = %attendee.id, matched_by = ?matched_by, "Token redeemed");

        Ok(RedemptionOutcome {
            attendee: Attendee {
                redeemed: true,
                redeemed_at: Some(redeemed_at),
                ..attendee
            },
            redeemed_at,
            matched_by,
        })
    }
}
