use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};

use crate::auth::{ClientCredentials, OAuthError, TokenRequest};
use crate::state::AppState;

/// `POST /oauth/token`: the client authenticates with HTTP Basic, the grant
/// parameters arrive form-encoded.
pub async fn issue_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<TokenRequest>, FormRejection>,
) -> Result<Response, OAuthError> {
    let Form(request) =
        form.map_err(|rejection| OAuthError::InvalidRequest(rejection.body_text()))?;
    let client = ClientCredentials::from_headers(&headers);
    let token = state.tokens.grant(client, request).await?;

    Ok((
        [
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
            (header::PRAGMA, HeaderValue::from_static("no-cache")),
        ],
        Json(token),
    )
        .into_response())
}
