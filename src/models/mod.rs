pub mod appointment;
pub mod exercise;
pub mod journal;
pub mod medication;
pub mod mood;
pub mod sleep;
pub mod user;
