use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer, Config};
use crate::handlers::{
    create_event, get_event, health_check, index, issue_token, list_events, update_event,
};
use crate::state::AppState;

pub fn create_routes(state: AppState, config: &Config) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api", get(index))
        .route("/api/events", get(list_events).post(create_event))
        .route("/api/events/:id", get(get_event).put(update_event))
        .route("/oauth/token", post(issue_token))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer(config.production))
        .layer(create_cors_layer(&config.cors_allowed_origins))
}
