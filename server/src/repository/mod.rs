//! Persistence for events and accounts.
//!
//! Handlers only see the traits. [`postgres`] backs them with sqlx and
//! [`memory`] keeps everything in process for development and tests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Account, Event};

pub mod memory;
pub mod page;
pub mod postgres;

pub use memory::{InMemoryAccountRepository, InMemoryEventRepository};
pub use page::{Direction, EventProperty, Page, PageRequest, Sort};
pub use postgres::{PgAccountRepository, PgEventRepository};

pub type RepositoryResult<T> = Result<T, sqlx::Error>;

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Inserts the event, or replaces the stored event with the same id.
    async fn save(&self, event: &Event) -> RepositoryResult<Event>;

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Event>>;

    async fn find_all(&self, request: PageRequest) -> RepositoryResult<Page<Event>>;
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Inserts the account. When the email is already taken the stored
    /// account keeps its id and takes the new password and roles.
    async fn save(&self, account: &Account) -> RepositoryResult<Account>;

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<Account>>;
}
