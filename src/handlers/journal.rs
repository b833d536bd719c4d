use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::{ClearResponse, DeleteResponse};
use crate::error::{AppError, AppResult};
use crate::models::journal::{CreateJournalRequest, JournalEntry, JournalQuery};
use crate::services::clock;
use crate::AppState;

pub async fn create_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateJournalRequest>,
) -> AppResult<Json<JournalEntry>> {
    body.validate()?;

    let entry = sqlx::query_as::<_, JournalEntry>(
        r#"
        INSERT INTO journal_entries (id, user_id, entry_date, body, journal_type)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(body.entry_date.unwrap_or_else(clock::today))
    .bind(&body.body)
    .bind(body.journal_type.unwrap_or_default())
    .fetch_one(&state.db)
    .await?;

    Ok(Json(entry))
}

pub async fn list_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<JournalQuery>,
) -> AppResult<Json<Vec<JournalEntry>>> {
    let entries = sqlx::query_as::<_, JournalEntry>(
        r#"
        SELECT * FROM journal_entries
        WHERE user_id = $1 AND ($2::journal_type IS NULL OR journal_type = $2)
        ORDER BY entry_date DESC, created_at DESC
        "#,
    )
    .bind(auth_user.id)
    .bind(query.journal_type)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(entries))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<DeleteResponse>> {
    let result = sqlx::query("DELETE FROM journal_entries WHERE id = $1 AND user_id = $2")
        .bind(entry_id)
        .bind(auth_user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Journal entry not found".into()));
    }

    Ok(Json(DeleteResponse {
        deleted: true,
        id: entry_id,
    }))
}

/// Remove every journal entry the user owns.
pub async fn clear_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<ClearResponse>> {
    let result = sqlx::query("DELETE FROM journal_entries WHERE user_id = $1")
        .bind(auth_user.id)
        .execute(&state.db)
        .await?;

    tracing::info!(user_id = %auth_user.id, deleted = result.rows_affected(), "Journal cleared");

    Ok(Json(ClearResponse {
        deleted: result.rows_affected(),
    }))
}
