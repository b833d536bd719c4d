use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MoodEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Emoji or icon key picked by the user.
    pub icon: String,
    pub note: String,
    pub logged_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMoodRequest {
    #[validate(length(min = 1, max = 32, message = "Icon must be 1-32 characters"))]
    pub icon: String,
    #[validate(length(max = 5000, message = "Note must be under 5000 characters"))]
    pub note: Option<String>,
    pub logged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct MoodQuery {
    pub days: Option<i64>,
}

impl MoodQuery {
    /// Clamp the lookback window to 1..=365 days, default 30.
    pub fn range_days(&self) -> i64 {
        self.days.unwrap_or(30).clamp(1, 365)
    }
}
