use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::{AccountService, TokenService};
use crate::config::Config;
use crate::repository::{
    AccountRepository, EventRepository, InMemoryAccountRepository, InMemoryEventRepository,
    PgAccountRepository, PgEventRepository,
};

/// Shared handler state. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub events: Arc<dyn EventRepository>,
    pub accounts: Arc<AccountService>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(
        events: Arc<dyn EventRepository>,
        accounts: Arc<dyn AccountRepository>,
        config: &Config,
    ) -> Self {
        let accounts = Arc::new(AccountService::new(accounts, config.password_hash_cost));
        let tokens = Arc::new(TokenService::new(accounts.clone(), config.oauth.clone()));
        Self {
            events,
            accounts,
            tokens,
        }
    }

    pub fn in_memory(config: &Config) -> Self {
        Self::new(
            Arc::new(InMemoryEventRepository::new()),
            Arc::new(InMemoryAccountRepository::new()),
            config,
        )
    }

    pub fn postgres(pool: PgPool, config: &Config) -> Self {
        Self::new(
            Arc::new(PgEventRepository::new(pool.clone())),
            Arc::new(PgAccountRepository::new(pool)),
            config,
        )
    }
}
