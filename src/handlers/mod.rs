pub mod appointments;
pub mod auth;
pub mod exercise;
pub mod health;
pub mod journal;
pub mod medications;
pub mod moods;
pub mod sleep;
pub mod weather;
pub mod ws;

#[cfg(test)]
mod test_support;
