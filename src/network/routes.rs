//! Route table

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::service::ConfigService;

use super::handlers;

/// Shared state handed to every handler
pub struct AppState {
    pub service: ConfigService,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(service: ConfigService, max_body_bytes: usize) -> Self {
        Self {
            service,
            max_body_bytes,
        }
    }
}

/// Build the router for the `/config` API
pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_body_bytes);

    Router::new()
        .route(
            "/config",
            post(handlers::create_config)
                .patch(handlers::update_config)
                .fallback(handlers::route_not_found),
        )
        .route(
            "/config/{client}",
            get(handlers::get_latest_config).fallback(handlers::route_not_found),
        )
        .route(
            "/config/{client}/{version}",
            get(handlers::get_config)
                .patch(handlers::update_config_for_version)
                .put(handlers::replace_config)
                .delete(handlers::delete_config)
                .fallback(handlers::route_not_found),
        )
        .fallback(handlers::route_not_found)
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
