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
use crate::models::sleep::{CreateSleepRequest, SleepEntry, SleepStatsQuery};
use crate::services::clock;
use crate::services::streaks::{streak_stats, StreakStats};
use crate::AppState;

/// How far back the sleep list goes.
const SLEEP_LIST_DAYS: i64 = 30;

pub async fn create_sleep(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateSleepRequest>,
) -> AppResult<Json<SleepEntry>> {
    body.validate()?;

    let entry = sqlx::query_as::<_, SleepEntry>(
        r#"
        INSERT INTO sleep_entries (id, user_id, sleep_date, hours, quality)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(body.sleep_date.unwrap_or_else(clock::today))
    .bind(body.hours)
    .bind(body.quality)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(entry))
}

pub async fn list_sleep(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<SleepEntry>>> {
    let since = clock::today() - Duration::days(SLEEP_LIST_DAYS);

    let entries = sqlx::query_as::<_, SleepEntry>(
        r#"
        SELECT * FROM sleep_entries
        WHERE user_id = $1 AND sleep_date >= $2
        ORDER BY sleep_date DESC, created_at DESC
        "#,
    )
    .bind(auth_user.id)
    .bind(since)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(entries))
}

pub async fn delete_sleep(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<DeleteResponse>> {
    let result = sqlx::query("DELETE FROM sleep_entries WHERE id = $1 AND user_id = $2")
        .bind(entry_id)
        .bind(auth_user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Sleep entry not found".into()));
    }

    Ok(Json(DeleteResponse {
        deleted: true,
        id: entry_id,
    }))
}

pub async fn get_sleep_stats(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<SleepStatsQuery>,
) -> AppResult<Json<StreakStats>> {
    let goal = query.goal_hours.unwrap_or(state.config.sleep_goal_hours);
    if !(goal > 0.0 && goal <= 24.0) {
        return Err(AppError::Validation("goal_hours must be between 0 and 24".into()));
    }

    let entries = sqlx::query_as::<_, SleepEntry>(
        "SELECT * FROM sleep_entries WHERE user_id = $1 ORDER BY sleep_date ASC",
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(streak_stats(&entries, goal, clock::today())))
}
