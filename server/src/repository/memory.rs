use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Account, Event};
use crate::repository::{
    AccountRepository, EventRepository, Page, PageRequest, RepositoryResult,
};

#[derive(Debug, Default)]
pub struct InMemoryEventRepository {
    events: RwLock<HashMap<Uuid, Event>>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn save(&self, event: &Event) -> RepositoryResult<Event> {
        self.events.write().await.insert(event.id, event.clone());
        Ok(event.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Event>> {
        Ok(self.events.read().await.get(&id).cloned())
    }

    async fn find_all(&self, request: PageRequest) -> RepositoryResult<Page<Event>> {
        let mut events: Vec<Event> = self.events.read().await.values().cloned().collect();

        // Ties (and unsorted listings) fall back to id order so pages are stable.
        events.sort_by(|a, b| {
            request
                .sort
                .map(|sort| sort.compare(a, b))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });

        let total_elements = events.len() as u64;
        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let content = events
            .into_iter()
            .skip(offset)
            .take(request.size as usize)
            .collect();

        Ok(Page {
            content,
            request,
            total_elements,
        })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryAccountRepository {
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn save(&self, account: &Account) -> RepositoryResult<Account> {
        let mut accounts = self.accounts.write().await;
        let stored = match accounts.get(&account.email) {
            Some(existing) => Account {
                id: existing.id,
                ..account.clone()
            },
            None => account.clone(),
        };
        accounts.insert(stored.email.clone(), stored.clone());
        Ok(stored)
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<Account>> {
        Ok(self.accounts.read().await.get(email).cloned())
    }
}
