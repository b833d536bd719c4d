//! The one wall clock the service schedules against.
//!
//! Dose times, prescribed dates, the daily reset and every "today" used by the
//! logging endpoints are resolved in the server's local timezone.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};

pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn today() -> NaiveDate {
    now().date()
}

/// Calendar day an instant falls on in server-local time.
pub fn local_date(at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&Local).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_date_matches_local_calendar() {
        let at = Local::now();
        assert_eq!(local_date(at.with_timezone(&Utc)), at.date_naive());
    }

    #[test]
    fn test_today_agrees_with_now() {
        let before = now().date();
        let day = today();
        assert!(day == before || day == before.succ_opt().unwrap());
    }
}
