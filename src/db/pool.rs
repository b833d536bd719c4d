use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

const MAX_CONNECTIONS: u32 = 20;
const ACQUIRE_TIMEOUT_SECS: u64 = 5;

fn pool_options() -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
}

pub async fn create_pool(database_url: &str) -> PgPool {
    let pool = pool_options()
        .connect(database_url)
        .await
        .expect("Failed to create database pool");

    tracing::info!(max_connections = MAX_CONNECTIONS, "Database pool ready");
    pool
}

/// Pool that only connects on first use. Router tests rely on this so they
/// can run without a database.
#[cfg(test)]
pub fn create_lazy_pool(database_url: &str) -> PgPool {
    pool_options()
        .connect_lazy(database_url)
        .expect("Invalid database URL")
}
