//! Carebell server library logic.

pub mod api;
pub mod api_assistant;
pub mod api_auth;
pub mod api_medications;
pub mod api_voice;
pub mod config;
pub mod middleware;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use carebell_assistant::DialogueBridge;
use carebell_db::DbPool;
use carebell_voice::TokenService;
use middleware::RateLimiter;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    /// Issues LiveKit join tokens.
    pub token_service: Arc<TokenService>,
    /// Medication assistant.
    pub bridge: Arc<DialogueBridge>,
    pub rate_limiter: RateLimiter,
    /// Requests allowed per client IP per minute.
    pub rate_limit_per_minute: u32,
    /// Lifetime of newly issued sessions.
    pub session_ttl: chrono::Duration,
}

/// Maximum request body size (1 MiB).
const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/auth/signout", post(api_auth::sign_out_handler))
        .route("/api/auth/me", get(api_auth::me_handler))
        .route(
            "/api/medications",
            post(api_medications::create_medication_handler)
                .get(api_medications::list_medications_handler),
        )
        .route(
            "/api/reminders",
            get(api_medications::list_reminders_handler),
        )
        .route(
            "/api/reminders/{reminderId}",
            patch(api_medications::update_reminder_handler),
        )
        .route(
            "/api/reminders/{reminderId}/log",
            post(api_medications::log_dose_handler),
        )
        .route("/api/voice/token", post(api_voice::issue_token_handler))
        .route("/api/assistant/chat", post(api_assistant::chat_handler))
        .route(
            "/api/assistant/reminder",
            post(api_assistant::reminder_handler),
        )
        .route(
            "/api/assistant/summary",
            post(api_assistant::summary_handler),
        )
        .layer(axum::middleware::from_fn(middleware::auth_middleware));

    Router::new()
        .route("/health", get(health))
        .route("/api/auth/signup", post(api_auth::sign_up_handler))
        .route("/api/auth/signin", post(api_auth::sign_in_handler))
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(axum::middleware::from_fn(middleware::rate_limit_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state)))
}
