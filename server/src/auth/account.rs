use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::config::SeedAccounts;
use crate::models::{Account, AccountRole};
use crate::repository::AccountRepository;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No account registered for '{0}'")]
    UsernameNotFound(String),

    #[error("Bad credentials")]
    BadCredentials,

    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing failed")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("Password hashing task failed")]
    HashTask(#[from] tokio::task::JoinError),
}

/// What the authentication layer knows about a principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDetails {
    pub account_id: Uuid,
    pub username: String,
    /// Stored bcrypt hash.
    pub password: String,
    pub authorities: BTreeSet<String>,
}

impl UserDetails {
    fn from_account(account: Account) -> Self {
        Self {
            account_id: account.id,
            authorities: account.roles.iter().map(AccountRole::authority).collect(),
            username: account.email,
            password: account.password,
        }
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }
}

/// Bridges stored accounts to authentication: hashes passwords on the way
/// in and resolves user details by email on the way out.
pub struct AccountService {
    repository: Arc<dyn AccountRepository>,
    hash_cost: u32,
}

impl AccountService {
    pub fn new(repository: Arc<dyn AccountRepository>, hash_cost: u32) -> Self {
        Self {
            repository,
            hash_cost,
        }
    }

    /// Saves `account`, treating its `password` as the raw password.
    pub async fn save_account(&self, mut account: Account) -> Result<Account, AuthError> {
        let raw = std::mem::take(&mut account.password);
        let cost = self.hash_cost;
        account.password = tokio::task::spawn_blocking(move || bcrypt::hash(raw, cost)).await??;

        let saved = self.repository.save(&account).await?;
        tracing::debug!(email = %saved.email, "Account saved");
        Ok(saved)
    }

    pub async fn load_user_by_username(&self, username: &str) -> Result<UserDetails, AuthError> {
        self.find_account(username)
            .await?
            .map(UserDetails::from_account)
            .ok_or_else(|| AuthError::UsernameNotFound(username.to_string()))
    }

    pub async fn find_account(&self, email: &str) -> Result<Option<Account>, AuthError> {
        Ok(self.repository.find_by_email(email).await?)
    }

    /// Checks a raw password. Unknown users and wrong passwords are both
    /// reported as [`AuthError::BadCredentials`].
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<UserDetails, AuthError> {
        let user = match self.load_user_by_username(username).await {
            Ok(user) => user,
            Err(AuthError::UsernameNotFound(username)) => {
                tracing::debug!(%username, "Authentication failed: unknown user");
                return Err(AuthError::BadCredentials);
            }
            Err(e) => return Err(e),
        };

        let raw = password.to_string();
        let hash = user.password.clone();
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(raw, &hash)).await??;
        if matches {
            Ok(user)
        } else {
            tracing::debug!(username = %user.username, "Authentication failed: wrong password");
            Err(AuthError::BadCredentials)
        }
    }

    /// Creates the configured admin and user accounts.
    pub async fn seed(&self, seed: &SeedAccounts) -> Result<(), AuthError> {
        let admin = Account::new(
            &seed.admin_username,
            &seed.admin_password,
            [AccountRole::Admin, AccountRole::User],
        );
        let user = Account::new(&seed.user_username, &seed.user_password, [AccountRole::User]);

        for account in [admin, user] {
            let saved = self.save_account(account).await?;
            tracing::info!(email = %saved.email, "Seeded account");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryAccountRepository;

    fn service() -> AccountService {
        AccountService::new(Arc::new(InMemoryAccountRepository::new()), 4)
    }

    #[tokio::test]
    async fn test_load_user_maps_roles_to_authorities() {
        let service = service();
        service
            .save_account(Account::new(
                "admin@email.com",
                "admin",
                [AccountRole::Admin, AccountRole::User],
            ))
            .await
            .unwrap();

        let user = service.load_user_by_username("admin@email.com").await.unwrap();

        assert_eq!(user.username, "admin@email.com");
        assert!(user.has_authority("ROLE_ADMIN"));
        assert!(user.has_authority("ROLE_USER"));
        assert_eq!(user.authorities.len(), 2);
    }

    #[tokio::test]
    async fn test_passwords_are_stored_hashed() {
        let service = service();
        let saved = service
            .save_account(Account::new("user@email.com", "user", [AccountRole::User]))
            .await
            .unwrap();

        assert_ne!(saved.password, "user");
        assert!(bcrypt::verify("user", &saved.password).unwrap());
    }

    #[tokio::test]
    async fn test_unknown_user_carries_the_lookup_key() {
        let err = service()
            .load_user_by_username("ghost@email.com")
            .await
            .unwrap_err();

        match err {
            AuthError::UsernameNotFound(username) => assert_eq!(username, "ghost@email.com"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_authenticate_checks_the_password() {
        let service = service();
        service
            .save_account(Account::new("user@email.com", "user", [AccountRole::User]))
            .await
            .unwrap();

        assert!(service.authenticate("user@email.com", "user").await.is_ok());
        assert!(matches!(
            service.authenticate("user@email.com", "wrong").await,
            Err(AuthError::BadCredentials)
        ));
        assert!(matches!(
            service.authenticate("ghost@email.com", "user").await,
            Err(AuthError::BadCredentials)
        ));
    }

    #[tokio::test]
    async fn test_seed_creates_admin_and_user() {
        let service = service();
        let seed = SeedAccounts {
            admin_username: "admin@email.com".to_string(),
            admin_password: "admin".to_string(),
            user_username: "user@email.com".to_string(),
            user_password: "user".to_string(),
        };

        service.seed(&seed).await.unwrap();
        // Seeding again must not fail on the existing emails.
        service.seed(&seed).await.unwrap();

        let admin = service.load_user_by_username("admin@email.com").await.unwrap();
        let user = service.load_user_by_username("user@email.com").await.unwrap();
        assert!(admin.has_authority("ROLE_ADMIN"));
        assert!(!user.has_authority("ROLE_ADMIN"));
    }
}
