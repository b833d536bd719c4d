use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExerciseEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub elapsed_secs: i64,
    pub exercise_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateExerciseRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    #[validate(range(min = 0, max = 86400, message = "Elapsed time must be 0-86400 seconds"))]
    pub elapsed_secs: i64,
    pub exercise_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ExerciseStatsQuery {
    pub goal_minutes: Option<f64>,
}
