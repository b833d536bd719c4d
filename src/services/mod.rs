pub mod clock;
pub mod daily_reset;
pub mod dose_schedule;
pub mod reminders;
pub mod streaks;
pub mod weather;
