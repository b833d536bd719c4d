use chrono::{Duration, NaiveDateTime, NaiveTime};
use sqlx::PgPool;

use crate::services::clock;

const RESET_PERIOD_SECS: u64 = 24 * 60 * 60;

/// Spawn the job that zeroes every medication's `doses_used_today`.
///
/// First run is at `reset_hour` server-local time, then every 24 hours.
pub fn spawn_daily_reset_worker(db: PgPool, reset_hour: u32) {
    tokio::spawn(async move {
        let delay = delay_until_next_reset(clock::now(), reset_hour);
        tracing::info!(
            reset_hour = reset_hour,
            first_run_in_secs = delay.num_seconds(),
            "Daily dose reset scheduled"
        );

        let start = tokio::time::Instant::now()
            + delay.to_std().unwrap_or(std::time::Duration::ZERO);
        let mut interval = tokio::time::interval_at(
            start,
            std::time::Duration::from_secs(RESET_PERIOD_SECS),
        );

        loop {
            interval.tick().await;
            match reset_dose_counters(&db).await {
                Ok(count) => {
                    tracing::info!(medications = count, "Daily dose counters reset");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Daily dose reset failed");
                }
            }
        }
    });
}

/// Time from `now` until the next `reset_hour`:00. A reset instant equal to
/// `now` counts as due.
pub fn delay_until_next_reset(now: NaiveDateTime, reset_hour: u32) -> Duration {
    let reset_time = NaiveTime::from_hms_opt(reset_hour, 0, 0).unwrap_or(NaiveTime::MIN);
    let mut due = now.date().and_time(reset_time);
    if due < now {
        due += Duration::days(1);
    }
    due - now
}

/// Zero every counter. Safe to run any number of times.
pub async fn reset_dose_counters(db: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE medications
        SET doses_used_today = 0, updated_at = NOW()
        WHERE doses_used_today <> 0
        "#,
    )
    .execute(db)
    .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 5, 12)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_delay_before_reset_hour_is_same_day() {
        assert_eq!(delay_until_next_reset(at(1, 30), 4), Duration::minutes(150));
    }

    #[test]
    fn test_delay_after_reset_hour_rolls_to_tomorrow() {
        assert_eq!(delay_until_next_reset(at(4, 1), 4), Duration::minutes(23 * 60 + 59));
        assert_eq!(delay_until_next_reset(at(22, 0), 4), Duration::hours(6));
    }

    #[test]
    fn test_delay_exactly_at_reset_hour_is_zero() {
        assert_eq!(delay_until_next_reset(at(4, 0), 4), Duration::zero());
    }

    #[test]
    fn test_delay_never_exceeds_a_day() {
        for h in 0..24 {
            for m in [0, 17, 59] {
                let delay = delay_until_next_reset(at(h, m), 4);
                assert!(delay >= Duration::zero());
                assert!(delay < Duration::days(1));
            }
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_reset_zeroes_counters_and_is_idempotent(db: PgPool) {
        let user_id = uuid::Uuid::new_v4();
        sqlx::query("INSERT INTO users (id, email, password_hash, name) VALUES ($1, 'a@b.c', 'x', 'A')")
            .bind(user_id)
            .execute(&db)
            .await
            .unwrap();
        for used in [0, 2, 3] {
            sqlx::query(
                r#"
                INSERT INTO medications (user_id, name, dosage, frequency, first_dose_time, doses_used_today)
                VALUES ($1, 'Med', '1 tab', 3, '08:00', $2)
                "#,
            )
            .bind(user_id)
            .bind(used)
            .execute(&db)
            .await
            .unwrap();
        }

        assert_eq!(reset_dose_counters(&db).await.unwrap(), 2);
        assert_eq!(reset_dose_counters(&db).await.unwrap(), 0);

        let remaining: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM medications WHERE doses_used_today <> 0")
                .fetch_one(&db)
                .await
                .unwrap();
        assert_eq!(remaining, 0);
    }
}
