use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::utils::response::success;

pub mod events;
pub mod index;
pub mod oauth;

pub use events::{create_event, get_event, list_events, update_event};
pub use index::index;
pub use oauth::issue_token;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "event-api",
    };

    success(payload, "Health check successful").into_response()
}
