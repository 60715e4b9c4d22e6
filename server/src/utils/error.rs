use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::AuthError;
use crate::utils::hal::{ErrorModel, INDEX_PATH};
use crate::utils::response::{error as error_response, Hal};
use crate::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed with {} error(s)", .0.len())]
    Validation(ValidationErrors),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal server error")]
    InternalServerError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    fn log(&self) {
        match self {
            AppError::Validation(errors) => {
                warn!(errors = errors.len(), object = errors.object_name(), "Validation failed");
            }
            AppError::AuthError(msg) | AppError::NotFound(msg) => {
                warn!(code = self.code(), message = %msg, "Request rejected");
            }
            AppError::InternalServerError(msg) => {
                error!(error = ?self, message = %msg, "Application error");
            }
            AppError::DatabaseError(e) => {
                error!(error = ?e, "Database error");
            }
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<AuthError> for AppError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::UsernameNotFound(_) | AuthError::BadCredentials => {
                AppError::AuthError(error.to_string())
            }
            AuthError::Database(e) => AppError::DatabaseError(e),
            other => AppError::InternalServerError(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Log internal details
        self.log();

        let public_message = match self {
            AppError::Validation(errors) => {
                return (status, Hal(ErrorModel::from(errors))).into_response();
            }
            AppError::AuthError(msg) | AppError::NotFound(msg) => msg,
            AppError::DatabaseError(_) => "A database error occurred".to_string(),
            AppError::InternalServerError(_) => "An internal error occurred".to_string(),
        };

        let mut response = error_response(code, public_message, None, status);
        match status {
            StatusCode::UNAUTHORIZED => {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            }
            StatusCode::NOT_FOUND => {
                response
                    .headers_mut()
                    .insert(header::LOCATION, HeaderValue::from_static(INDEX_PATH));
            }
            _ => {}
        }
        response
    }
}
