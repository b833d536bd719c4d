//! Streak and progress calculations over dated log entries.
//!
//! Entries are summed per calendar day, compared against a goal, and the
//! resulting set of completed days is scanned for consecutive runs.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::models::exercise::ExerciseEntry;
use crate::models::mood::MoodEntry;
use crate::models::sleep::SleepEntry;
use crate::services::clock;

/// A log entry that contributes an amount to one calendar day.
pub trait DailyMetric {
    fn date(&self) -> NaiveDate;
    fn amount(&self) -> f64;
}

impl DailyMetric for SleepEntry {
    fn date(&self) -> NaiveDate {
        self.sleep_date
    }

    fn amount(&self) -> f64 {
        self.hours
    }
}

impl DailyMetric for ExerciseEntry {
    fn date(&self) -> NaiveDate {
        self.exercise_date
    }

    /// Minutes of exercise.
    fn amount(&self) -> f64 {
        self.elapsed_secs as f64 / 60.0
    }
}

impl DailyMetric for MoodEntry {
    fn date(&self) -> NaiveDate {
        clock::local_date(self.logged_at)
    }

    fn amount(&self) -> f64 {
        1.0
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DayProgress {
    pub date: NaiveDate,
    pub total: f64,
    /// total / goal, clamped to [0, 1]
    pub ratio: f64,
}

#[derive(Debug, Serialize)]
pub struct StreakStats {
    pub goal: f64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub days_completed: usize,
    pub week: Vec<DayProgress>,
}

pub fn daily_totals<M: DailyMetric>(entries: &[M]) -> BTreeMap<NaiveDate, f64> {
    let mut totals = BTreeMap::new();
    for entry in entries {
        *totals.entry(entry.date()).or_insert(0.0) += entry.amount();
    }
    totals
}

pub fn completed_dates(totals: &BTreeMap<NaiveDate, f64>, goal: f64) -> BTreeSet<NaiveDate> {
    totals
        .iter()
        .filter(|(_, total)| **total >= goal)
        .map(|(date, _)| *date)
        .collect()
}

pub fn longest_streak(dates: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0u32;
    let mut run = 0u32;
    let mut prev: Option<NaiveDate> = None;

    // BTreeSet iterates in ascending order.
    for date in dates {
        run = match prev {
            Some(p) if *date == p + Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(*date);
    }

    longest
}

/// Consecutive completed days ending today. Yesterday alone does not count.
pub fn current_streak(dates: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0u32;
    let mut check_date = today;

    while dates.contains(&check_date) {
        streak += 1;
        check_date -= Duration::days(1);
    }

    streak
}

/// Progress for the seven days ending today, oldest first.
pub fn weekly_progress(
    totals: &BTreeMap<NaiveDate, f64>,
    goal: f64,
    today: NaiveDate,
) -> Vec<DayProgress> {
    (0..7)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            let total = totals.get(&date).copied().unwrap_or(0.0);
            DayProgress {
                date,
                total,
                ratio: progress_ratio(total, goal),
            }
        })
        .collect()
}

fn progress_ratio(total: f64, goal: f64) -> f64 {
    if goal <= 0.0 {
        return 1.0;
    }
    (total / goal).clamp(0.0, 1.0)
}

pub fn streak_stats<M: DailyMetric>(entries: &[M], goal: f64, today: NaiveDate) -> StreakStats {
    let totals = daily_totals(entries);
    let completed = completed_dates(&totals, goal);

    StreakStats {
        goal,
        current_streak: current_streak(&completed, today),
        longest_streak: longest_streak(&completed),
        days_completed: completed.len(),
        week: weekly_progress(&totals, goal, today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Logged(NaiveDate, f64);

    impl DailyMetric for Logged {
        fn date(&self) -> NaiveDate {
            self.0
        }

        fn amount(&self) -> f64 {
            self.1
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn set(days: &[u32]) -> BTreeSet<NaiveDate> {
        days.iter().map(|day| d(*day)).collect()
    }

    #[test]
    fn test_longest_streak_with_gap() {
        assert_eq!(longest_streak(&set(&[1, 2, 3, 6])), 3);
    }

    #[test]
    fn test_longest_streak_empty_and_single() {
        assert_eq!(longest_streak(&BTreeSet::new()), 0);
        assert_eq!(longest_streak(&set(&[9])), 1);
    }

    #[test]
    fn test_longest_streak_across_month_boundary() {
        let dates: BTreeSet<NaiveDate> = [
            NaiveDate::from_ymd_opt(2026, 2, 27).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        ]
        .into_iter()
        .collect();
        assert_eq!(longest_streak(&dates), 3);
    }

    #[test]
    fn test_current_streak_zero_without_today() {
        // Yesterday and the day before are logged, today is not.
        assert_eq!(current_streak(&set(&[8, 9]), d(10)), 0);
    }

    #[test]
    fn test_current_streak_counts_back_from_today() {
        assert_eq!(current_streak(&set(&[5, 7, 8, 9, 10]), d(10)), 4);
        assert_eq!(current_streak(&set(&[10]), d(10)), 1);
    }

    #[test]
    fn test_daily_totals_sum_per_day() {
        let entries = vec![Logged(d(1), 3.0), Logged(d(1), 4.5), Logged(d(2), 8.0)];
        let totals = daily_totals(&entries);
        assert_eq!(totals.get(&d(1)), Some(&7.5));
        assert_eq!(totals.get(&d(2)), Some(&8.0));
    }

    #[test]
    fn test_completed_dates_meet_goal_inclusive() {
        let entries = vec![Logged(d(1), 7.5), Logged(d(2), 8.0), Logged(d(3), 9.0)];
        let totals = daily_totals(&entries);
        assert_eq!(completed_dates(&totals, 8.0), set(&[2, 3]));
    }

    #[test]
    fn test_weekly_progress_shape_and_clamp() {
        let entries = vec![Logged(d(10), 12.0), Logged(d(8), 4.0)];
        let week = weekly_progress(&daily_totals(&entries), 8.0, d(10));

        assert_eq!(week.len(), 7);
        assert_eq!(week.first().unwrap().date, d(4));
        assert_eq!(week.last().unwrap().date, d(10));
        assert_eq!(week[6].ratio, 1.0);
        assert_eq!(week[4].ratio, 0.5);
        assert_eq!(week[5].total, 0.0);
    }

    #[test]
    fn test_streak_stats_combines_calculators() {
        let entries = vec![
            Logged(d(1), 30.0),
            Logged(d(2), 10.0),
            Logged(d(2), 25.0),
            Logged(d(3), 15.0),
            Logged(d(9), 30.0),
            Logged(d(10), 45.0),
        ];
        let stats = streak_stats(&entries, 30.0, d(10));
        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.longest_streak, 2);
        assert_eq!(stats.days_completed, 4);
    }

    #[test]
    fn test_exercise_amount_is_minutes() {
        let entry = ExerciseEntry {
            id: uuid::Uuid::new_v4(),
            user_id: uuid::Uuid::new_v4(),
            name: "Run".into(),
            elapsed_secs: 1800,
            exercise_date: d(1),
            created_at: chrono::Utc::now(),
        };
        assert_eq!(entry.amount(), 30.0);
    }

    #[test]
    fn test_mood_counts_on_local_calendar_day() {
        let logged_local = NaiveDate::from_ymd_opt(2026, 3, 10)
            .unwrap()
            .and_hms_opt(23, 30, 0)
            .unwrap()
            .and_local_timezone(chrono::Local)
            .earliest()
            .unwrap();
        let entry = MoodEntry {
            id: uuid::Uuid::new_v4(),
            user_id: uuid::Uuid::new_v4(),
            icon: "smile".into(),
            note: String::new(),
            logged_at: logged_local.with_timezone(&chrono::Utc),
        };
        assert_eq!(entry.date(), d(10));
        assert_eq!(entry.amount(), 1.0);
    }
}
