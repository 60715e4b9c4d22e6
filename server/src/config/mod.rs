use std::env;
use std::net::SocketAddr;

use thiserror::Error;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_CLIENT_ID: &str = "myApp";
const DEFAULT_CLIENT_SECRET: &str = "pass";
const DEFAULT_ACCESS_TOKEN_VALIDITY_SECS: i64 = 10 * 60;
const DEFAULT_REFRESH_TOKEN_VALIDITY_SECS: i64 = 6 * 10 * 60;
pub(crate) const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

/// OAuth2 client registration and token lifetimes.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub access_token_validity_secs: i64,
    pub refresh_token_validity_secs: i64,
}

/// Accounts created at startup.
#[derive(Debug, Clone)]
pub struct SeedAccounts {
    pub admin_username: String,
    pub admin_password: String,
    pub user_username: String,
    pub user_password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// When unset the server runs on in-memory repositories.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub bind_addr: SocketAddr,
    pub production: bool,
    pub cors_allowed_origins: String,
    pub password_hash_cost: u32,
    pub oauth: OAuthConfig,
    pub seed: SeedAccounts,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            max_connections: parse(&lookup, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            bind_addr: parse(&lookup, "BIND_ADDR", default_bind_addr())?,
            production: lookup("RUST_ENV")
                .map(|v| v.to_lowercase() == "production")
                .unwrap_or(false),
            cors_allowed_origins: text("CORS_ALLOWED_ORIGINS", DEFAULT_ALLOWED_ORIGINS),
            password_hash_cost: parse(&lookup, "PASSWORD_HASH_COST", bcrypt::DEFAULT_COST)?,
            oauth: OAuthConfig {
                client_id: text("OAUTH_CLIENT_ID", DEFAULT_CLIENT_ID),
                client_secret: text("OAUTH_CLIENT_SECRET", DEFAULT_CLIENT_SECRET),
                access_token_validity_secs: parse(
                    &lookup,
                    "ACCESS_TOKEN_VALIDITY_SECS",
                    DEFAULT_ACCESS_TOKEN_VALIDITY_SECS,
                )?,
                refresh_token_validity_secs: parse(
                    &lookup,
                    "REFRESH_TOKEN_VALIDITY_SECS",
                    DEFAULT_REFRESH_TOKEN_VALIDITY_SECS,
                )?,
            },
            seed: SeedAccounts {
                admin_username: text("APP_ADMIN_USERNAME", "admin@email.com"),
                admin_password: text("APP_ADMIN_PASSWORD", "admin"),
                user_username: text("APP_USER_USERNAME", "user@email.com"),
                user_password: text("APP_USER_PASSWORD", "user"),
            },
        })
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3001))
}

fn parse<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = config_from(&[]).unwrap();

        assert!(config.database_url.is_none());
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:3001");
        assert_eq!(config.max_connections, 5);
        assert!(!config.production);
        assert_eq!(config.oauth.client_id, "myApp");
        assert_eq!(config.oauth.access_token_validity_secs, 600);
        assert_eq!(config.oauth.refresh_token_validity_secs, 3600);
        assert_eq!(config.seed.user_username, "user@email.com");
        assert_eq!(config.password_hash_cost, bcrypt::DEFAULT_COST);
    }

    #[test]
    fn test_overrides_from_environment() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/events"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("RUST_ENV", "Production"),
            ("OAUTH_CLIENT_ID", "console"),
            ("ACCESS_TOKEN_VALIDITY_SECS", "30"),
        ])
        .unwrap();

        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/events")
        );
        assert_eq!(config.bind_addr.port(), 8080);
        assert!(config.production);
        assert_eq!(config.oauth.client_id, "console");
        assert_eq!(config.oauth.access_token_validity_secs, 30);
    }

    #[test]
    fn test_blank_database_url_means_in_memory() {
        let config = config_from(&[("DATABASE_URL", "  ")]).unwrap();
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let err = config_from(&[("DATABASE_MAX_CONNECTIONS", "many")]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_MAX_CONNECTIONS"));
    }
}
