use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::utils::error::AppError;
use crate::utils::hal::HAL_JSON;

#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
    pub details: Option<Value>,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: ApiErrorBody,
}

/// A body rendered as `application/hal+json`.
#[derive(Debug, Clone)]
pub struct Hal<T>(pub T);

impl<T> IntoResponse for Hal<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(body) => (
                [(header::CONTENT_TYPE, HeaderValue::from_static(HAL_JSON))],
                body,
            )
                .into_response(),
            Err(e) => {
                AppError::InternalServerError(format!("Failed to serialize response: {e}"))
                    .into_response()
            }
        }
    }
}

/// 201 with a `Location` header pointing at the new resource.
pub fn created<T>(location: &str, body: T) -> Response
where
    T: Serialize,
{
    let mut response = (StatusCode::CREATED, Hal(body)).into_response();
    match HeaderValue::from_str(location) {
        Ok(value) => {
            response.headers_mut().insert(header::LOCATION, value);
            response
        }
        Err(_) => AppError::InternalServerError(format!("Invalid location '{location}'"))
            .into_response(),
    }
}

pub fn success<T>(data: T, message: impl Into<String>) -> impl IntoResponse
where
    T: Serialize,
{
    let body = ApiResponse {
        success: true,
        data: Some(data),
        message: Some(message.into()),
    };
    (StatusCode::OK, Json(body))
}

pub fn error(
    code: &str,
    message: impl Into<String>,
    details: Option<Value>,
    status: StatusCode,
) -> Response {
    let body = ApiErrorResponse {
        success: false,
        error: ApiErrorBody {
            code: code.to_string(),
            message: message.into(),
            details,
        },
    };

    (status, Json(body)).into_response()
}
