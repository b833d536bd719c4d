use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SleepEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub sleep_date: NaiveDate,
    pub hours: f64,
    /// 1 (poor) to 5 (great).
    pub quality: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSleepRequest {
    pub sleep_date: Option<NaiveDate>,
    #[validate(range(min = 0.1, max = 24.0, message = "Hours must be between 0.1 and 24"))]
    pub hours: f64,
    #[validate(range(min = 1, max = 5, message = "Quality must be 1-5"))]
    pub quality: i32,
}

#[derive(Debug, Deserialize)]
pub struct SleepStatsQuery {
    pub goal_hours: Option<f64>,
}
