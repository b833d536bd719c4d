use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::Duration;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::DeleteResponse;
use crate::error::{AppError, AppResult};
use crate::models::exercise::{CreateExerciseRequest, ExerciseEntry, ExerciseStatsQuery};
use crate::services::clock;
use crate::services::streaks::{streak_stats, StreakStats};
use crate::AppState;

const EXERCISE_LIST_DAYS: i64 = 30;

pub async fn create_exercise(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateExerciseRequest>,
) -> AppResult<Json<ExerciseEntry>> {
    body.validate()?;

    let entry = sqlx::query_as::<_, ExerciseEntry>(
        r#"
        INSERT INTO exercise_entries (id, user_id, name, elapsed_secs, exercise_date)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(&body.name)
    .bind(body.elapsed_secs)
    .bind(body.exercise_date.unwrap_or_else(clock::today))
    .fetch_one(&state.db)
    .await?;

    Ok(Json(entry))
}

pub async fn list_exercise(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<ExerciseEntry>>> {
    let since = clock::today() - Duration::days(EXERCISE_LIST_DAYS);

    let entries = sqlx::query_as::<_, ExerciseEntry>(
        r#"
        SELECT * FROM exercise_entries
        WHERE user_id = $1 AND exercise_date >= $2
        ORDER BY exercise_date DESC, created_at DESC
        "#,
    )
    .bind(auth_user.id)
    .bind(since)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(entries))
}

pub async fn delete_exercise(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<DeleteResponse>> {
    let result = sqlx::query("DELETE FROM exercise_entries WHERE id = $1 AND user_id = $2")
        .bind(entry_id)
        .bind(auth_user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Exercise entry not found".into()));
    }

    Ok(Json(DeleteResponse {
        deleted: true,
        id: entry_id,
    }))
}

pub async fn get_exercise_stats(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<ExerciseStatsQuery>,
) -> AppResult<Json<StreakStats>> {
    let goal = query.goal_minutes.unwrap_or(state.config.exercise_goal_minutes);
    if !(goal > 0.0 && goal <= 1440.0) {
        return Err(AppError::Validation("goal_minutes must be between 0 and 1440".into()));
    }

    let entries = sqlx::query_as::<_, ExerciseEntry>(
        "SELECT * FROM exercise_entries WHERE user_id = $1 ORDER BY exercise_date ASC",
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(streak_stats(&entries, goal, clock::today())))
}
