//! Dose-time arithmetic for medications.
//!
//! A medication taken `N` times a day gets `N` doses spaced `24 / N` hours
//! apart (integer hours), starting at the first-dose time. A dose that lands
//! exactly on midnight is moved to 23:00 so it stays on the same day.

use chrono::{NaiveTime, Timelike};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Returns `frequency` dose times, starting at `first_dose`.
///
/// A `frequency` of zero yields no doses; callers validate the range.
pub fn calculate_dose_times(first_dose: NaiveTime, frequency: u32) -> Vec<NaiveTime> {
    if frequency == 0 {
        return Vec::new();
    }

    let interval_hours = 24 / frequency;
    let start = first_dose.hour() * 60 + first_dose.minute();

    (0..frequency)
        .map(|i| {
            let minutes = (start + i * interval_hours * 60) % MINUTES_PER_DAY;
            if minutes == 0 {
                return midnight_substitute();
            }
            NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).unwrap_or(first_dose)
        })
        .collect()
}

fn midnight_substitute() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// First dose strictly after `now`, or `None` once the day's doses have passed.
pub fn next_dose_after(dose_times: &[NaiveTime], now: NaiveTime) -> Option<NaiveTime> {
    dose_times.iter().copied().filter(|t| *t > now).min()
}
