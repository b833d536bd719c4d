use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod auth;
mod config;
mod db;
mod dto;
mod error;
mod handlers;
mod models;
mod services;

use auth::rate_limit::RateLimitState;
use config::Config;
use services::weather::WeatherClient;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub ws_tx: broadcast::Sender<String>,
    pub rate_limiter: RateLimitState,
    pub weather: WeatherClient,
}

impl AppState {
    pub fn new(db: PgPool, config: Arc<Config>) -> anyhow::Result<Self> {
        let (ws_tx, _) = broadcast::channel::<String>(256);
        let weather = WeatherClient::new(
            config.weather_api_url.clone(),
            config.advice_api_url.clone(),
            Duration::from_secs(config.http_timeout_secs),
        )?;

        Ok(Self {
            db,
            config,
            ws_tx,
            rate_limiter: RateLimitState::default(),
            weather,
        })
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "halocare_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env());

    let db = db::create_pool(&config.database_url).await;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations applied");

    let state = AppState::new(db, config.clone()).expect("Failed to initialise app state");

    services::daily_reset::spawn_daily_reset_worker(state.db.clone(), config.daily_reset_hour);
    services::reminders::spawn_reminder_worker(
        state.db.clone(),
        state.ws_tx.clone(),
        config.reminder_poll_secs,
    );
    state.rate_limiter.spawn_cleanup();

    let app = router(state).layer(cors_layer(&config));

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listen address");
    // Client IP is needed by the auth rate limiter.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .expect("Server error");
}

fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::rate_limit_auth,
        ));

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route("/ws", get(handlers::ws::ws_handler))
        .merge(auth_routes);

    let protected_routes = Router::new()
        .route(
            "/api/me",
            get(handlers::auth::me).put(handlers::auth::update_me),
        )
        .route("/api/auth/logout", post(handlers::auth::logout))
        // Medications
        .route(
            "/api/medications",
            get(handlers::medications::list_medications)
                .post(handlers::medications::create_medication),
        )
        .route("/api/medications/today", get(handlers::medications::list_today))
        .route(
            "/api/medications/:id",
            get(handlers::medications::get_medication)
                .put(handlers::medications::update_medication)
                .delete(handlers::medications::delete_medication),
        )
        .route(
            "/api/medications/:id/schedule",
            get(handlers::medications::get_schedule),
        )
        .route("/api/medications/:id/take", post(handlers::medications::take_dose))
        // Mood
        .route(
            "/api/moods",
            get(handlers::moods::list_moods).post(handlers::moods::create_mood),
        )
        .route("/api/moods/streak", get(handlers::moods::get_mood_streak))
        .route("/api/moods/:id", delete(handlers::moods::delete_mood))
        // Sleep
        .route(
            "/api/sleep",
            get(handlers::sleep::list_sleep).post(handlers::sleep::create_sleep),
        )
        .route("/api/sleep/stats", get(handlers::sleep::get_sleep_stats))
        .route("/api/sleep/:id", delete(handlers::sleep::delete_sleep))
        // Exercise
        .route(
            "/api/exercise",
            get(handlers::exercise::list_exercise).post(handlers::exercise::create_exercise),
        )
        .route("/api/exercise/stats", get(handlers::exercise::get_exercise_stats))
        .route("/api/exercise/:id", delete(handlers::exercise::delete_exercise))
        // Journal
        .route(
            "/api/journal",
            get(handlers::journal::list_entries)
                .post(handlers::journal::create_entry)
                .delete(handlers::journal::clear_entries),
        )
        .route("/api/journal/:id", delete(handlers::journal::delete_entry))
        // Appointments
        .route(
            "/api/appointments",
            get(handlers::appointments::list_appointments)
                .post(handlers::appointments::create_appointment),
        )
        .route(
            "/api/appointments/:id",
            delete(handlers::appointments::delete_appointment),
        )
        // Widgets
        .route("/api/weather", get(handlers::weather::get_weather))
        .route("/api/advice", get(handlers::weather::get_advice))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let mut origins: Vec<axum::http::HeaderValue> = Vec::new();
    match config.frontend_url.parse::<axum::http::HeaderValue>() {
        Ok(hv) => origins.push(hv),
        Err(_) => tracing::warn!(frontend_url = %config.frontend_url, "FRONTEND_URL is not a valid origin"),
    }
    // Extra origins, e.g. a phone on the LAN during development
    if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
        for o in extra.split(',') {
            if let Ok(hv) = o.trim().parse::<axum::http::HeaderValue>() {
                origins.push(hv);
            }
        }
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn test_state() -> AppState {
        let config = Arc::new(Config::for_tests());
        let db = db::create_lazy_pool(&config.database_url);
        AppState::new(db, config).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_service() {
        let response = router(test_state())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["service"], "halocare-api");
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_protected_route_requires_token() {
        let response = router(test_state())
            .oneshot(Request::get("/api/medications").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], 401);
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let state = test_state();
        let pair =
            auth::jwt::create_token_pair(Uuid::new_v4(), "sam@example.com", &state.config).unwrap();

        let response = router(state)
            .oneshot(
                Request::get("/api/journal")
                    .header(header::AUTHORIZATION, format!("Bearer {}", pair.refresh_token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_weather_validates_coordinates_before_calling_out() {
        let state = test_state();
        let pair =
            auth::jwt::create_token_pair(Uuid::new_v4(), "sam@example.com", &state.config).unwrap();

        let response = router(state)
            .oneshot(
                Request::get("/api/weather?latitude=120&longitude=0")
                    .header(header::AUTHORIZATION, format!("Bearer {}", pair.access_token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_advice_failure_is_wrapped_in_envelope() {
        let state = test_state();
        let pair =
            auth::jwt::create_token_pair(Uuid::new_v4(), "sam@example.com", &state.config).unwrap();

        let response = router(state)
            .oneshot(
                Request::get("/api/advice")
                    .header(header::AUTHORIZATION, format!("Bearer {}", pair.access_token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "error");
    }

    #[tokio::test]
    async fn test_readyz_without_database_is_unavailable() {
        let response = router(test_state())
            .oneshot(Request::get("/readyz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["checks"]["database"], "failed");
    }
}
