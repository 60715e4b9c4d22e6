use axum::response::{IntoResponse, Response};

use crate::utils::hal::{rel, Links, RepresentationModel, EVENTS_PATH};
use crate::utils::response::Hal;

/// Entry point of the API: links to every top-level collection.
pub async fn index() -> Response {
    let model = RepresentationModel {
        links: Links::new().with(rel::EVENTS, EVENTS_PATH),
    };
    Hal(model).into_response()
}
