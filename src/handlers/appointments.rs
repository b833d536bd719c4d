use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::DeleteResponse;
use crate::error::{AppError, AppResult};
use crate::models::appointment::{Appointment, AppointmentQuery, CreateAppointmentRequest};
use crate::AppState;

pub async fn create_appointment(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateAppointmentRequest>,
) -> AppResult<Json<Appointment>> {
    body.validate()?;

    if body.scheduled_at < Utc::now() {
        return Err(AppError::Validation(
            "Appointments must be booked in the future".into(),
        ));
    }

    let appointment = sqlx::query_as::<_, Appointment>(
        r#"
        INSERT INTO appointments (id, user_id, provider_name, location, scheduled_at, notes)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(&body.provider_name)
    .bind(&body.location)
    .bind(body.scheduled_at)
    .bind(&body.notes)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(appointment))
}

/// Soonest first. Past appointments only when asked for.
pub async fn list_appointments(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<AppointmentQuery>,
) -> AppResult<Json<Vec<Appointment>>> {
    let appointments = sqlx::query_as::<_, Appointment>(
        r#"
        SELECT * FROM appointments
        WHERE user_id = $1 AND ($2 OR scheduled_at >= NOW())
        ORDER BY scheduled_at ASC
        "#,
    )
    .bind(auth_user.id)
    .bind(query.include_past.unwrap_or(false))
    .fetch_all(&state.db)
    .await?;

    Ok(Json(appointments))
}

pub async fn delete_appointment(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(appointment_id): Path<Uuid>,
) -> AppResult<Json<DeleteResponse>> {
    let result = sqlx::query("DELETE FROM appointments WHERE id = $1 AND user_id = $2")
        .bind(appointment_id)
        .bind(auth_user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Appointment not found".into()));
    }

    Ok(Json(DeleteResponse {
        deleted: true,
        id: appointment_id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{state, user};
    use chrono::Duration;
    use sqlx::PgPool;

    fn booking(days_from_now: i64) -> Json<CreateAppointmentRequest> {
        Json(CreateAppointmentRequest {
            provider_name: "Dr. Okafor".into(),
            location: Some("Clinic 2".into()),
            scheduled_at: Utc::now() + Duration::days(days_from_now),
            notes: None,
        })
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_past_booking_is_rejected(db: PgPool) {
        let sam = user(&db, "sam@example.com").await;
        let result = create_appointment(state(db.clone()), sam, booking(-1)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_bookings_are_scoped_to_their_owner(db: PgPool) {
        let sam = user(&db, "sam@example.com").await;
        let alex = user(&db, "alex@example.com").await;

        let Json(later) = create_appointment(state(db.clone()), sam.clone(), booking(7))
            .await
            .unwrap();
        let Json(sooner) = create_appointment(state(db.clone()), sam.clone(), booking(2))
            .await
            .unwrap();

        let upcoming = AppointmentQuery { include_past: None };
        let Json(listed) = list_appointments(state(db.clone()), sam.clone(), Query(upcoming))
            .await
            .unwrap();
        let ids: Vec<Uuid> = listed.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![sooner.id, later.id]);

        let upcoming = AppointmentQuery { include_past: None };
        let Json(others) = list_appointments(state(db.clone()), alex.clone(), Query(upcoming))
            .await
            .unwrap();
        assert!(others.is_empty());

        let result = delete_appointment(state(db.clone()), alex, Path(later.id)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let Json(deleted) = delete_appointment(state(db.clone()), sam, Path(later.id))
            .await
            .unwrap();
        assert!(deleted.deleted);
    }
}
