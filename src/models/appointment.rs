use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Appointment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider_name: String,
    pub location: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAppointmentRequest {
    #[validate(length(min = 1, max = 200, message = "Provider name must be 1-200 characters"))]
    pub provider_name: String,
    #[validate(length(max = 500, message = "Location must be under 500 characters"))]
    pub location: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    #[validate(length(max = 5000, message = "Notes must be under 5000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AppointmentQuery {
    /// Include appointments that already happened. Default: false.
    pub include_past: Option<bool>,
}
