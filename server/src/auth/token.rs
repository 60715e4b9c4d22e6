//! OAuth2 token issuance for the password and refresh-token grants.
//!
//! Tokens are opaque random strings kept in process memory, so they do not
//! survive a restart.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::auth::account::{AccountService, AuthError};
use crate::config::OAuthConfig;

pub const SCOPE: &str = "read write";
const TOKEN_TYPE: &str = "bearer";
const TOKEN_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Bad client credentials")]
    InvalidClient,

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    InvalidGrant(String),

    #[error("Unsupported grant type: {0}")]
    UnsupportedGrantType(String),

    #[error("Token endpoint failure")]
    Server(#[source] AuthError),
}

impl OAuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            OAuthError::InvalidClient => StatusCode::UNAUTHORIZED,
            OAuthError::InvalidRequest(_)
            | OAuthError::InvalidGrant(_)
            | OAuthError::UnsupportedGrantType(_) => StatusCode::BAD_REQUEST,
            OAuthError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// RFC 6749 error code.
    pub fn code(&self) -> &'static str {
        match self {
            OAuthError::InvalidClient => "invalid_client",
            OAuthError::InvalidRequest(_) => "invalid_request",
            OAuthError::InvalidGrant(_) => "invalid_grant",
            OAuthError::UnsupportedGrantType(_) => "unsupported_grant_type",
            OAuthError::Server(_) => "server_error",
        }
    }
}

impl From<AuthError> for OAuthError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::BadCredentials | AuthError::UsernameNotFound(_) => {
                OAuthError::InvalidGrant("Bad credentials".to_string())
            }
            other => OAuthError::Server(other),
        }
    }
}

#[derive(Serialize)]
struct OAuthErrorBody {
    error: &'static str,
    error_description: String,
}

impl IntoResponse for OAuthError {
    fn into_response(self) -> Response {
        match &self {
            OAuthError::Server(source) => {
                tracing::error!(error = ?source, "Token endpoint failure")
            }
            other => tracing::warn!(code = other.code(), message = %other, "Token request rejected"),
        }

        let body = OAuthErrorBody {
            error: self.code(),
            error_description: self.to_string(),
        };
        let mut response = (self.status_code(), Json(body)).into_response();
        if matches!(self, OAuthError::InvalidClient) {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Basic realm=\"oauth2/client\""),
            );
        }
        response
    }
}

/// Form parameters of `POST /oauth/token`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequest {
    pub grant_type: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub scope: String,
}

/// Client id and secret from an HTTP Basic `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        let (scheme, encoded) = value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }
        let decoded = STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (client_id, client_secret) = decoded.split_once(':')?;
        Some(Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
struct StoredToken {
    username: String,
    /// The access token for a refresh entry and vice versa.
    paired_with: String,
    expires_at: DateTime<Utc>,
}

impl StoredToken {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Default)]
struct Tokens {
    access: HashMap<String, StoredToken>,
    refresh: HashMap<String, StoredToken>,
}

impl Tokens {
    /// Drops every expired token, including ones nobody presents again.
    fn evict_expired(&mut self, now: DateTime<Utc>) {
        self.access.retain(|_, token| !token.is_expired(now));
        self.refresh.retain(|_, token| !token.is_expired(now));
    }
}

#[derive(Debug)]
pub struct TokenStore {
    tokens: RwLock<Tokens>,
    access_validity: Duration,
    refresh_validity: Duration,
}

impl TokenStore {
    pub fn new(access_validity_secs: i64, refresh_validity_secs: i64) -> Self {
        Self {
            tokens: RwLock::new(Tokens::default()),
            access_validity: Duration::seconds(access_validity_secs),
            refresh_validity: Duration::seconds(refresh_validity_secs),
        }
    }

    pub async fn issue(&self, username: &str) -> TokenResponse {
        let access_token = generate_token();
        let refresh_token = generate_token();
        let now = Utc::now();

        let mut tokens = self.tokens.write().await;
        tokens.evict_expired(now);
        tokens.access.insert(
            access_token.clone(),
            StoredToken {
                username: username.to_string(),
                paired_with: refresh_token.clone(),
                expires_at: now + self.access_validity,
            },
        );
        tokens.refresh.insert(
            refresh_token.clone(),
            StoredToken {
                username: username.to_string(),
                paired_with: access_token.clone(),
                expires_at: now + self.refresh_validity,
            },
        );

        TokenResponse {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
            refresh_token,
            expires_in: self.access_validity.num_seconds(),
            scope: SCOPE.to_string(),
        }
    }

    /// Username behind a live access token. Expired tokens are dropped.
    pub async fn read_access_token(&self, access_token: &str) -> Option<String> {
        let now = Utc::now();
        {
            let tokens = self.tokens.read().await;
            match tokens.access.get(access_token) {
                None => return None,
                Some(stored) if !stored.is_expired(now) => return Some(stored.username.clone()),
                Some(_) => {}
            }
        }

        self.tokens.write().await.access.remove(access_token);
        None
    }

    /// Consumes a refresh token and revokes the access token issued with it.
    /// Returns the username when the refresh token was live.
    pub async fn redeem_refresh_token(&self, refresh_token: &str) -> Option<String> {
        let mut tokens = self.tokens.write().await;
        let stored = tokens.refresh.remove(refresh_token)?;
        tokens.access.remove(&stored.paired_with);

        if stored.is_expired(Utc::now()) {
            None
        } else {
            Some(stored.username)
        }
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// The authorization server: authenticates the client, then dispatches on
/// the grant type.
pub struct TokenService {
    store: TokenStore,
    accounts: Arc<AccountService>,
    client: OAuthConfig,
}

impl TokenService {
    pub fn new(accounts: Arc<AccountService>, client: OAuthConfig) -> Self {
        Self {
            store: TokenStore::new(
                client.access_token_validity_secs,
                client.refresh_token_validity_secs,
            ),
            accounts,
            client,
        }
    }

    pub async fn grant(
        &self,
        client: Option<ClientCredentials>,
        request: TokenRequest,
    ) -> Result<TokenResponse, OAuthError> {
        let client = client.ok_or(OAuthError::InvalidClient)?;
        if !self.is_registered_client(&client) {
            return Err(OAuthError::InvalidClient);
        }

        let grant_type = required(request.grant_type, "grant_type")?;
        match grant_type.as_str() {
            "password" => {
                let username = required(request.username, "username")?;
                let password = required(request.password, "password")?;
                let user = self.accounts.authenticate(&username, &password).await?;

                tracing::info!(username = %user.username, "Issued access token");
                Ok(self.store.issue(&user.username).await)
            }
            "refresh_token" => {
                let refresh_token = required(request.refresh_token, "refresh_token")?;
                let username = self
                    .store
                    .redeem_refresh_token(&refresh_token)
                    .await
                    .ok_or_else(|| OAuthError::InvalidGrant("Invalid refresh token".to_string()))?;
                // The account may have been removed since the token was issued.
                let user = self.accounts.load_user_by_username(&username).await?;

                tracing::info!(username = %user.username, "Refreshed access token");
                Ok(self.store.issue(&user.username).await)
            }
            other => Err(OAuthError::UnsupportedGrantType(other.to_string())),
        }
    }

    /// Username behind a bearer token, if it is live.
    pub async fn resolve_access_token(&self, access_token: &str) -> Option<String> {
        self.store.read_access_token(access_token).await
    }

    fn is_registered_client(&self, client: &ClientCredentials) -> bool {
        client.client_id == self.client.client_id
            && constant_time_eq::constant_time_eq(
                client.client_secret.as_bytes(),
                self.client.client_secret.as_bytes(),
            )
    }
}

fn required(value: Option<String>, name: &str) -> Result<String, OAuthError> {
    value
        .filter(|value| !value.is_empty())
        .ok_or_else(|| OAuthError::InvalidRequest(format!("Missing parameter: {name}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, AccountRole};
    use crate::repository::InMemoryAccountRepository;

    fn oauth_config() -> OAuthConfig {
        OAuthConfig {
            client_id: "myApp".to_string(),
            client_secret: "pass".to_string(),
            access_token_validity_secs: 600,
            refresh_token_validity_secs: 3600,
        }
    }

    fn client() -> Option<ClientCredentials> {
        Some(ClientCredentials {
            client_id: "myApp".to_string(),
            client_secret: "pass".to_string(),
        })
    }

    fn password_grant(username: &str, password: &str) -> TokenRequest {
        TokenRequest {
            grant_type: Some("password".to_string()),
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            refresh_token: None,
        }
    }

    async fn token_service() -> TokenService {
        let accounts = Arc::new(AccountService::new(
            Arc::new(InMemoryAccountRepository::new()),
            4,
        ));
        accounts
            .save_account(Account::new("user@email.com", "user", [AccountRole::User]))
            .await
            .unwrap();
        TokenService::new(accounts, oauth_config())
    }

    #[tokio::test]
    async fn test_password_grant_issues_tokens() {
        let service = token_service().await;

        let response = service
            .grant(client(), password_grant("user@email.com", "user"))
            .await
            .unwrap();

        assert_eq!(response.token_type, "bearer");
        assert_eq!(response.expires_in, 600);
        assert_eq!(response.scope, "read write");
        assert_ne!(response.access_token, response.refresh_token);
        assert_eq!(
            service.resolve_access_token(&response.access_token).await,
            Some("user@email.com".to_string())
        );
    }

    #[tokio::test]
    async fn test_wrong_password_is_invalid_grant() {
        let service = token_service().await;

        let err = service
            .grant(client(), password_grant("user@email.com", "nope"))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "invalid_grant");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_client_is_rejected() {
        let service = token_service().await;
        let wrong_secret = Some(ClientCredentials {
            client_id: "myApp".to_string(),
            client_secret: "guess".to_string(),
        });

        for credentials in [None, wrong_secret] {
            let err = service
                .grant(credentials, password_grant("user@email.com", "user"))
                .await
                .unwrap_err();
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn test_unsupported_and_incomplete_requests() {
        let service = token_service().await;

        let mut request = password_grant("user@email.com", "user");
        request.grant_type = Some("client_credentials".to_string());
        let err = service.grant(client(), request).await.unwrap_err();
        assert_eq!(err.code(), "unsupported_grant_type");

        let mut request = password_grant("user@email.com", "user");
        request.password = None;
        let err = service.grant(client(), request).await.unwrap_err();
        assert_eq!(err.code(), "invalid_request");
    }

    #[tokio::test]
    async fn test_refresh_grant_rotates_tokens() {
        let service = token_service().await;
        let first = service
            .grant(client(), password_grant("user@email.com", "user"))
            .await
            .unwrap();

        let refresh = TokenRequest {
            grant_type: Some("refresh_token".to_string()),
            refresh_token: Some(first.refresh_token.clone()),
            ..TokenRequest::default()
        };
        let second = service.grant(client(), refresh.clone()).await.unwrap();

        assert_ne!(first.access_token, second.access_token);
        assert!(service.resolve_access_token(&first.access_token).await.is_none());
        assert!(service.resolve_access_token(&second.access_token).await.is_some());

        // A refresh token can only be redeemed once.
        let err = service.grant(client(), refresh).await.unwrap_err();
        assert_eq!(err.code(), "invalid_grant");
    }

    #[tokio::test]
    async fn test_expired_access_token_is_not_resolved() {
        let store = TokenStore::new(0, 0);
        let issued = store.issue("user@email.com").await;

        assert!(store.read_access_token(&issued.access_token).await.is_none());
        assert!(store.redeem_refresh_token(&issued.refresh_token).await.is_none());
    }

    #[tokio::test]
    async fn test_issuing_sweeps_abandoned_expired_tokens() {
        let store = TokenStore::new(0, 0);
        let first = store.issue("user@email.com").await;
        let second = store.issue("admin@email.com").await;

        let tokens = store.tokens.read().await;
        assert!(!tokens.access.contains_key(&first.access_token));
        assert!(!tokens.refresh.contains_key(&first.refresh_token));
        assert!(tokens.access.contains_key(&second.access_token));
        assert_eq!(tokens.access.len() + tokens.refresh.len(), 2);
    }

    #[test]
    fn test_client_credentials_from_basic_header() {
        let mut headers = HeaderMap::new();
        let encoded = STANDARD.encode("myApp:pa:ss");
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {encoded}")).unwrap(),
        );

        let credentials = ClientCredentials::from_headers(&headers).unwrap();
        assert_eq!(credentials.client_id, "myApp");
        assert_eq!(credentials.client_secret, "pa:ss");

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert!(ClientCredentials::from_headers(&headers).is_none());
    }

    #[test]
    fn test_generated_tokens_are_unique_and_url_safe() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
