use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, SubsecRound, Utc};
use sqlx::FromRow;
use rand::{distributions::Alphanumeric, Rng};
use std::fmt;

const TOKEN_LENGTH: usize = 32;
pub const QR_PAYLOAD_TYPE: &str = "food-token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MealPreference {
    #[serde(rename = "veg")]
    Vegetarian,
    #[serde(rename = "non-veg")]
    NonVegetarian,
}

impl MealPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealPreference::Vegetarian => "veg",
            MealPreference::NonVegetarian => "non-veg",
        }
    }

    /// Classifies free-text input. Anything that is not recognisably
    /// non-vegetarian is treated as vegetarian, including empty input.
    pub fn classify(raw: &str) -> Self {
        let value = raw.to_lowercase();
        if value.contains("non") {
            MealPreference::NonVegetarian
        } else {
            MealPreference::Vegetarian
        }
    }
}

impl fmt::Display for MealPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for MealPreference {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "veg" => Ok(MealPreference::Vegetarian),
            "non-veg" => Ok(MealPreference::NonVegetarian),
            other => Err(format!("unknown meal preference '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Attendee {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub class_name: Option<String>,
    pub enrollment_id: Option<String>,
    #[sqlx(try_from = "String")]
    pub meal_preference: MealPreference,
    pub token: String,
    pub qr_image_path: Option<String>,
    pub redeemed: bool,
    pub redeemed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Fields read from one roster row, before a token is issued.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewAttendee {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub class_name: Option<String>,
    pub enrollment_id: Option<String>,
    pub meal_preference: Option<MealPreference>,
}

impl Attendee {
    pub fn new(fields: NewAttendee) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: fields.name,
            email: fields.email,
            phone: fields.phone,
            class_name: fields.class_name,
            enrollment_id: fields.enrollment_id,
            meal_preference: fields.meal_preference.unwrap_or(MealPreference::Vegetarian),
            token: generate_token(),
            qr_image_path: None,
            redeemed: false,
            redeemed_at: None,
            created_at: current_timestamp(),
        }
    }

    /// The JSON document encoded into this attendee's QR code.
    pub fn qr_payload(&self) -> String {
        serde_json::json!({
            "token": self.token,
            "name": self.name,
            "type": QR_PAYLOAD_TYPE,
        })
        .to_string()
    }

    pub fn public_view(&self) -> PublicAttendee {
        PublicAttendee {
            name: self.name.clone(),
            meal_preference: self.meal_preference,
            enrollment_id: self.enrollment_id.clone(),
            class_name: self.class_name.clone(),
        }
    }
}

/// What the scanner is allowed to show about an attendee.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PublicAttendee {
    pub name: String,
    pub meal_preference: MealPreference,
    pub enrollment_id: Option<String>,
    pub class_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, Default, PartialEq)]
pub struct AttendeeStats {
    pub total_users: i64,
    pub scanned_count: i64,
    pub veg_count: i64,
    pub nonveg_count: i64,
    pub veg_scanned: i64,
    pub nonveg_scanned: i64,
}

pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Current time truncated to microseconds, the finest precision every backend stores.
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meal_preference_classification() {
        assert_eq!(MealPreference::classify("Veg"), MealPreference::Vegetarian);
        assert_eq!(MealPreference::classify("Non-Veg"), MealPreference::NonVegetarian);
        assert_eq!(MealPreference::classify("NON VEGETARIAN"), MealPreference::NonVegetarian);
        assert_eq!(MealPreference::classify("nonveg"), MealPreference::NonVegetarian);
        assert_eq!(MealPreference::classify(""), MealPreference::Vegetarian);
        assert_eq!(MealPreference::classify("Vegan"), MealPreference::Vegetarian);
        assert_eq!(MealPreference::classify("fish"), MealPreference::Vegetarian);
    }

    #[test]
    fn test_new_attendee_defaults() {
        let attendee = Attendee::new(NewAttendee {
            name: "Asha".into(),
            ..Default::default()
        });

        assert_eq!(attendee.meal_preference, MealPreference::Vegetarian);
        assert_eq!(attendee.token.len(), TOKEN_LENGTH);
        assert!(attendee.token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(!attendee.redeemed);
        assert!(attendee.redeemed_at.is_none());
    }

    #[test]
    fn test_qr_payload_shape() {
        let attendee = Attendee::new(NewAttendee {
            name: "Ravi".into(),
            ..Default::default()
        });
        let payload: serde_json::Value = serde_json::from_str(&attendee.qr_payload()).unwrap();

        assert_eq!(payload["token"], attendee.token.as_str());
        assert_eq!(payload["name"], "Ravi");
        assert_eq!(payload["type"], QR_PAYLOAD_TYPE);
    }

    #[test]
    fn test_tokens_are_not_reused() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
    }

    #[test]
    fn test_meal_preference_serializes_as_stored_value() {
        let json = serde_json::to_string(&MealPreference::NonVegetarian).unwrap();
        assert_eq!(json, "\"non-veg\"");
        assert_eq!(MealPreference::try_from("veg".to_string()), Ok(MealPreference::Vegetarian));
        assert!(MealPreference::try_from("vegan".to_string()).is_err());
    }
}
