use axum::extract::State;
use axum::{http::Method, response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod database;
pub mod dtos;
pub mod errors;
mod handlers;
pub mod models;
mod routes;
pub mod services;
pub mod state;

use state::AppState;

pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .allow_credentials(false);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/api/health", get(api_health_check))
        .nest("/api/matches", routes::matches::routes())
        .nest("/api/innings", routes::innings::routes())
        .nest("/api/overs", routes::overs::routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

async fn root_handler() -> &'static str {
    "🏏 Cricket Scoring API"
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn api_health_check(State(state): State<AppState>) -> Json<Value> {
    let store_status = match state.store.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!("Store ping failed: {}", e);
            "disconnected"
        }
    };

    Json(json!({
        "status": "healthy",
        "database": store_status,
        "config": state.config.get_config_info(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
