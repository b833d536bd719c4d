//! Fixtures for handler tests that run against a migrated database.

use std::sync::Arc;

use axum::{extract::State, Extension};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::config::Config;
use crate::AppState;

pub fn state(db: PgPool) -> State<AppState> {
    State(AppState::new(db, Arc::new(Config::for_tests())).unwrap())
}

pub async fn user(db: &PgPool, email: &str) -> Extension<AuthUser> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, email, password_hash, name) VALUES ($1, $2, 'x', 'Test')")
        .bind(id)
        .bind(email)
        .execute(db)
        .await
        .unwrap();

    Extension(AuthUser {
        id,
        email: email.to_string(),
    })
}
