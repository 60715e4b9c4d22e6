use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};

use crate::models::Account;
use crate::state::AppState;
use crate::utils::error::AppError;

/// The account behind the request's bearer token.
///
/// Handlers that only want to know who is calling take
/// `Option<CurrentAccount>`, which turns any rejection into `None`.
#[derive(Debug, Clone)]
pub struct CurrentAccount(pub Account);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentAccount {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(|| {
            AppError::AuthError("Full authentication is required to access this resource".to_string())
        })?;

        let username = state
            .tokens
            .resolve_access_token(token)
            .await
            .ok_or_else(|| AppError::AuthError("Invalid access token".to_string()))?;

        let account = state
            .accounts
            .find_account(&username)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid access token".to_string()))?;

        Ok(CurrentAccount(account))
    }
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(authorization: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(authorization));
        headers
    }

    #[test]
    fn test_bearer_token_is_extracted() {
        assert_eq!(bearer_token(&headers("Bearer abc123")), Some("abc123"));
        assert_eq!(bearer_token(&headers("bearer  abc123 ")), Some("abc123"));
    }

    #[test]
    fn test_other_schemes_are_ignored() {
        assert_eq!(bearer_token(&headers("Basic bXlBcHA6cGFzcw==")), None);
        assert_eq!(bearer_token(&headers("Bearer")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
