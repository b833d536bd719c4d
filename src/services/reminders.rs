use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::medication::Medication;
use crate::services::clock;
use crate::services::dose_schedule::calculate_dose_times;

const FIRST_DOSE_MESSAGE: &str = "Good morning! Time for your first dose.";
const DOSE_MESSAGE: &str = "It's time to take your medication.";

/// Doses older than this are not announced after a long stall.
const MAX_CATCH_UP_HOURS: i64 = 24;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DoseReminder {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub user_id: Uuid,
    pub medication_id: Uuid,
    pub name: String,
    pub dosage: String,
    pub dose_date: NaiveDate,
    pub dose_time: NaiveTime,
    pub message: &'static str,
}

/// Tracks the last instant whose reminders were dispatched. Each poll covers
/// `(last_processed, now]`, so late ticks, slow polling and failed polls
/// never lose a dose.
#[derive(Debug, Clone, Copy)]
pub struct ReminderCursor {
    last_processed: NaiveDateTime,
}

impl ReminderCursor {
    /// Doses in the current minute are still due.
    pub fn starting_at(now: NaiveDateTime) -> Self {
        let minute_start = now
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(now);
        Self {
            last_processed: minute_start - Duration::seconds(1),
        }
    }

    /// The window still to dispatch, or `None` when the clock has not moved
    /// forward.
    pub fn window(&self, now: NaiveDateTime) -> Option<(NaiveDateTime, NaiveDateTime)> {
        if now <= self.last_processed {
            return None;
        }
        let floor = now - Duration::hours(MAX_CATCH_UP_HOURS);
        Some((self.last_processed.max(floor), now))
    }

    pub fn advance(&mut self, to: NaiveDateTime) {
        if to > self.last_processed {
            self.last_processed = to;
        }
    }
}

/// Spawn the dispatcher that pushes dose reminders onto the broadcast channel.
pub fn spawn_reminder_worker(db: PgPool, tx: broadcast::Sender<String>, poll_secs: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(poll_secs));
        let mut cursor = ReminderCursor::starting_at(clock::now());

        loop {
            interval.tick().await;
            let Some((from, to)) = cursor.window(clock::now()) else {
                continue;
            };

            match dispatch_due_reminders(&db, &tx, from, to).await {
                Ok(sent) => {
                    if sent > 0 {
                        tracing::info!(
                            sent = sent,
                            from = %from,
                            to = %to,
                            "Dose reminders dispatched"
                        );
                    }
                    cursor.advance(to);
                }
                Err(e) => {
                    // Cursor stays put so the next tick retries this window.
                    tracing::error!(error = %e, from = %from, "Reminder worker error");
                }
            }
        }
    });
}

async fn dispatch_due_reminders(
    db: &PgPool,
    tx: &broadcast::Sender<String>,
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> Result<usize, sqlx::Error> {
    let medications =
        sqlx::query_as::<_, Medication>("SELECT * FROM medications WHERE reminder_enabled = true")
            .fetch_all(db)
            .await?;

    let reminders = due_reminders_between(&medications, from, to);
    for reminder in &reminders {
        match serde_json::to_string(reminder) {
            // No subscribers is not an error; the reminder is simply dropped.
            Ok(msg) => {
                let _ = tx.send(msg);
            }
            Err(e) => tracing::warn!(error = %e, "Failed to encode dose reminder"),
        }
    }

    Ok(reminders.len())
}

/// Reminders for every dose instant in `(from, to]`, across day boundaries.
/// A medication only fires on days it is prescribed, and a dose time that the
/// midnight clamp produces twice fires once.
pub fn due_reminders_between(
    medications: &[Medication],
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> Vec<DoseReminder> {
    let mut reminders = Vec::new();
    if to <= from {
        return reminders;
    }

    let mut day = from.date();
    while day <= to.date() {
        for medication in medications
            .iter()
            .filter(|m| m.reminder_enabled && m.is_active_on(day))
        {
            let times = calculate_dose_times(
                medication.first_dose_time,
                medication.frequency.max(0) as u32,
            );
            for (index, time) in times.iter().enumerate() {
                if times[..index].contains(time) {
                    continue;
                }
                let at = day.and_time(*time);
                if at > from && at <= to {
                    reminders.push(DoseReminder {
                        kind: "dose_reminder",
                        user_id: medication.user_id,
                        medication_id: medication.id,
                        name: medication.name.clone(),
                        dosage: medication.dosage.clone(),
                        dose_date: day,
                        dose_time: *time,
                        message: if index == 0 { FIRST_DOSE_MESSAGE } else { DOSE_MESSAGE },
                    });
                }
            }
        }

        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }

    reminders
}
