//! Music Moments API Library
//!
//! Core functionality for the music moments backend: listening, filtering
//! and authoring "moments" attached to songs, plus the one-shot migrator that
//! collapses duplicate moments into comments.
//! This library exposes modules for use in the binaries and integration tests.

use axum::{response::Json, routing::get, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod api;
pub mod blocking;
pub mod config;
pub mod db;
pub mod error;
pub mod services;

use config::Config;
use db::DbPool;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: DbPool,
}

impl AppState {
    pub fn new(config: Config, db: DbPool) -> Self {
        Self {
            config: Arc::new(config),
            db,
        }
    }
}

#[derive(Serialize)]
pub struct ApiResponse {
    pub message: String,
    pub version: String,
}

pub async fn health_check() -> Json<ApiResponse> {
    Json(ApiResponse {
        message: "Music API is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Build the complete application router.
///
/// Shared by `main` and the integration tests so both exercise the same
/// routes and layers.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/moments", api::moments::router())
        .nest("/api/songs", api::songs::router())
        .nest("/api/admin", api::admin::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
