//! wkrec-se library interface
//!
//! Exposes the suggested-edits pipeline and router for the service binary
//! and for integration testing.

pub mod api;
pub mod db;
pub mod entity;
pub mod error;
pub mod filter;
pub mod import;
pub mod language;
pub mod rank;
pub mod recommend;
pub mod retry;
pub mod sourcing;
pub mod upstream;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use recommend::Recommender;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use wkrec_common::config::TomlConfig;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
    /// Allow-lists and other per-request settings
    pub config: Arc<TomlConfig>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(recommender: Recommender, config: TomlConfig) -> Self {
        Self {
            recommender: Arc::new(recommender),
            config: Arc::new(config),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::article_routes())
        .merge(api::caption_routes())
        .merge(api::description_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
