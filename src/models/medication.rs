use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Medication {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub dosage: String,
    /// Doses per day.
    pub frequency: i32,
    pub first_dose_time: NaiveTime,
    pub prescribed_dates: Vec<NaiveDate>,
    pub reminder_enabled: bool,
    pub doses_used_today: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Medication {
    /// An empty prescription list means the medication is taken every day.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.prescribed_dates.is_empty() || self.prescribed_dates.contains(&date)
    }

    pub fn doses_remaining(&self) -> i32 {
        (self.frequency - self.doses_used_today).max(0)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMedicationRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "Dosage must be 1-100 characters"))]
    pub dosage: String,
    #[validate(range(min = 1, max = 24, message = "Frequency must be 1-24 doses per day"))]
    pub frequency: i32,
    pub first_dose_time: NaiveTime,
    #[serde(default)]
    pub prescribed_dates: Vec<NaiveDate>,
    pub reminder_enabled: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMedicationRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Dosage must be 1-100 characters"))]
    pub dosage: Option<String>,
    #[validate(range(min = 1, max = 24, message = "Frequency must be 1-24 doses per day"))]
    pub frequency: Option<i32>,
    pub first_dose_time: Option<NaiveTime>,
    pub prescribed_dates: Option<Vec<NaiveDate>>,
    pub reminder_enabled: Option<bool>,
}

/// Medication with its computed dose schedule for one day.
#[derive(Debug, Serialize)]
pub struct MedicationSchedule {
    #[serde(flatten)]
    pub medication: Medication,
    pub dose_times: Vec<NaiveTime>,
    pub doses_remaining: i32,
    pub next_dose: Option<NaiveTime>,
}
