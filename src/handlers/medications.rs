use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::DeleteResponse;
use crate::error::{AppError, AppResult};
use crate::models::medication::{
    CreateMedicationRequest, Medication, MedicationSchedule, UpdateMedicationRequest,
};
use crate::services::clock;
use crate::services::dose_schedule::{calculate_dose_times, next_dose_after};
use crate::AppState;

fn with_schedule(medication: Medication) -> MedicationSchedule {
    let now = clock::now().time();
    let dose_times =
        calculate_dose_times(medication.first_dose_time, medication.frequency.max(0) as u32);
    let next_dose = next_dose_after(&dose_times, now);
    let doses_remaining = medication.doses_remaining();

    MedicationSchedule {
        medication,
        dose_times,
        doses_remaining,
        next_dose,
    }
}

async fn find_owned(state: &AppState, user_id: Uuid, medication_id: Uuid) -> AppResult<Medication> {
    sqlx::query_as::<_, Medication>("SELECT * FROM medications WHERE id = $1 AND user_id = $2")
        .bind(medication_id)
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("Medication not found".into()))
}

pub async fn list_medications(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<Medication>>> {
    let medications = sqlx::query_as::<_, Medication>(
        "SELECT * FROM medications WHERE user_id = $1 ORDER BY first_dose_time ASC, name ASC",
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(medications))
}

/// Medications prescribed for today, with their dose schedule.
pub async fn list_today(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<MedicationSchedule>>> {
    let today = clock::today();

    let medications = sqlx::query_as::<_, Medication>(
        r#"
        SELECT * FROM medications
        WHERE user_id = $1
          AND (cardinality(prescribed_dates) = 0 OR $2 = ANY(prescribed_dates))
        ORDER BY first_dose_time ASC, name ASC
        "#,
    )
    .bind(auth_user.id)
    .bind(today)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(medications.into_iter().map(with_schedule).collect()))
}

pub async fn get_medication(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(medication_id): Path<Uuid>,
) -> AppResult<Json<Medication>> {
    Ok(Json(find_owned(&state, auth_user.id, medication_id).await?))
}

pub async fn get_schedule(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(medication_id): Path<Uuid>,
) -> AppResult<Json<MedicationSchedule>> {
    let medication = find_owned(&state, auth_user.id, medication_id).await?;
    Ok(Json(with_schedule(medication)))
}

pub async fn create_medication(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateMedicationRequest>,
) -> AppResult<Json<Medication>> {
    body.validate()?;

    let mut prescribed_dates = body.prescribed_dates;
    prescribed_dates.sort_unstable();
    prescribed_dates.dedup();

    let medication = sqlx::query_as::<_, Medication>(
        r#"
        INSERT INTO medications (id, user_id, name, dosage, frequency, first_dose_time, prescribed_dates, reminder_enabled)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(&body.name)
    .bind(&body.dosage)
    .bind(body.frequency)
    .bind(body.first_dose_time)
    .bind(&prescribed_dates)
    .bind(body.reminder_enabled.unwrap_or(true))
    .fetch_one(&state.db)
    .await?;

    tracing::info!(
        user_id = %auth_user.id,
        medication_id = %medication.id,
        frequency = medication.frequency,
        "Medication created"
    );

    Ok(Json(medication))
}

pub async fn update_medication(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(medication_id): Path<Uuid>,
    Json(body): Json<UpdateMedicationRequest>,
) -> AppResult<Json<Medication>> {
    body.validate()?;

    let prescribed_dates = body.prescribed_dates.map(|mut dates| {
        dates.sort_unstable();
        dates.dedup();
        dates
    });

    // Lowering the frequency below today's count clamps the counter.
    let medication = sqlx::query_as::<_, Medication>(
        r#"
        UPDATE medications SET
            name = COALESCE($3, name),
            dosage = COALESCE($4, dosage),
            frequency = COALESCE($5, frequency),
            first_dose_time = COALESCE($6, first_dose_time),
            prescribed_dates = COALESCE($7, prescribed_dates),
            reminder_enabled = COALESCE($8, reminder_enabled),
            doses_used_today = LEAST(doses_used_today, COALESCE($5, frequency)),
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(medication_id)
    .bind(auth_user.id)
    .bind(&body.name)
    .bind(&body.dosage)
    .bind(body.frequency)
    .bind(body.first_dose_time)
    .bind(&prescribed_dates)
    .bind(body.reminder_enabled)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Medication not found".into()))?;

    Ok(Json(medication))
}

pub async fn delete_medication(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(medication_id): Path<Uuid>,
) -> AppResult<Json<DeleteResponse>> {
    let result = sqlx::query("DELETE FROM medications WHERE id = $1 AND user_id = $2")
        .bind(medication_id)
        .bind(auth_user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Medication not found".into()));
    }

    Ok(Json(DeleteResponse {
        deleted: true,
        id: medication_id,
    }))
}

/// Record one dose taken today. Taking more than `frequency` doses is refused.
pub async fn take_dose(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(medication_id): Path<Uuid>,
) -> AppResult<Json<MedicationSchedule>> {
    // Atomic check-and-increment
    let updated = sqlx::query_as::<_, Medication>(
        r#"
        UPDATE medications SET
            doses_used_today = doses_used_today + 1,
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2 AND doses_used_today < frequency
        RETURNING *
        "#,
    )
    .bind(medication_id)
    .bind(auth_user.id)
    .fetch_optional(&state.db)
    .await?;

    match updated {
        Some(medication) => {
            tracing::debug!(
                medication_id = %medication.id,
                doses_used_today = medication.doses_used_today,
                "Dose taken"
            );
            Ok(Json(with_schedule(medication)))
        }
        None => {
            // Distinguish a missing medication from an exhausted one.
            find_owned(&state, auth_user.id, medication_id).await?;
            Err(AppError::Conflict("All doses for today have been taken".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{state, user};
    use chrono::NaiveTime;
    use sqlx::PgPool;

    fn create_request(frequency: i32) -> Json<CreateMedicationRequest> {
        Json(CreateMedicationRequest {
            name: "Metformin".into(),
            dosage: "500mg".into(),
            frequency,
            first_dose_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            prescribed_dates: vec![],
            reminder_enabled: None,
        })
    }

    async fn doses_used(db: &PgPool, medication_id: Uuid) -> i32 {
        sqlx::query_scalar("SELECT doses_used_today FROM medications WHERE id = $1")
            .bind(medication_id)
            .fetch_one(db)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_take_until_frequency_then_conflict(db: PgPool) {
        let owner = user(&db, "sam@example.com").await;
        let Json(medication) = create_medication(state(db.clone()), owner.clone(), create_request(2))
            .await
            .unwrap();

        let Json(first) = take_dose(state(db.clone()), owner.clone(), Path(medication.id))
            .await
            .unwrap();
        assert_eq!(first.doses_remaining, 1);

        let Json(second) = take_dose(state(db.clone()), owner.clone(), Path(medication.id))
            .await
            .unwrap();
        assert_eq!(second.doses_remaining, 0);

        let third = take_dose(state(db.clone()), owner, Path(medication.id)).await;
        assert!(matches!(third, Err(AppError::Conflict(_))));
        assert_eq!(doses_used(&db, medication.id).await, 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_take_on_another_users_medication_is_not_found(db: PgPool) {
        let owner = user(&db, "sam@example.com").await;
        let other = user(&db, "alex@example.com").await;
        let Json(medication) = create_medication(state(db.clone()), owner, create_request(3))
            .await
            .unwrap();

        let result = take_dose(state(db.clone()), other.clone(), Path(medication.id)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let missing = take_dose(state(db.clone()), other, Path(Uuid::new_v4())).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        assert_eq!(doses_used(&db, medication.id).await, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_lowering_frequency_clamps_todays_count(db: PgPool) {
        let owner = user(&db, "sam@example.com").await;
        let Json(medication) = create_medication(state(db.clone()), owner.clone(), create_request(3))
            .await
            .unwrap();
        for _ in 0..3 {
            take_dose(state(db.clone()), owner.clone(), Path(medication.id))
                .await
                .unwrap();
        }

        let Json(updated) = update_medication(
            state(db.clone()),
            owner,
            Path(medication.id),
            Json(UpdateMedicationRequest {
                name: None,
                dosage: None,
                frequency: Some(1),
                first_dose_time: None,
                prescribed_dates: None,
                reminder_enabled: None,
            }),
        )
        .await
        .unwrap();

        assert_eq!(updated.frequency, 1);
        assert_eq!(updated.doses_used_today, 1);
        assert_eq!(updated.doses_remaining(), 0);
    }
}
