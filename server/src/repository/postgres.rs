use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::{Account, AccountRole, Event};
use crate::repository::{
    AccountRepository, Direction, EventRepository, Page, PageRequest, RepositoryResult,
};

const EVENT_COLUMNS: &str = "id, name, description, begin_enrollment_date_time, \
    close_enrollment_date_time, begin_event_date_time, end_event_date_time, location, \
    base_price, max_price, limit_of_enrollment, offline, free, event_status, manager_id";

#[derive(Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn save(&self, event: &Event) -> RepositoryResult<Event> {
        let query = format!(
            "INSERT INTO events ({EVENT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             ON CONFLICT (id) DO UPDATE SET \
                name = EXCLUDED.name, \
                description = EXCLUDED.description, \
                begin_enrollment_date_time = EXCLUDED.begin_enrollment_date_time, \
                close_enrollment_date_time = EXCLUDED.close_enrollment_date_time, \
                begin_event_date_time = EXCLUDED.begin_event_date_time, \
                end_event_date_time = EXCLUDED.end_event_date_time, \
                location = EXCLUDED.location, \
                base_price = EXCLUDED.base_price, \
                max_price = EXCLUDED.max_price, \
                limit_of_enrollment = EXCLUDED.limit_of_enrollment, \
                offline = EXCLUDED.offline, \
                free = EXCLUDED.free, \
                event_status = EXCLUDED.event_status, \
                manager_id = EXCLUDED.manager_id \
             RETURNING {EVENT_COLUMNS}"
        );

        sqlx::query_as::<_, Event>(&query)
            .bind(event.id)
            .bind(&event.name)
            .bind(&event.description)
            .bind(event.begin_enrollment_date_time)
            .bind(event.close_enrollment_date_time)
            .bind(event.begin_event_date_time)
            .bind(event.end_event_date_time)
            .bind(&event.location)
            .bind(event.base_price)
            .bind(event.max_price)
            .bind(event.limit_of_enrollment)
            .bind(event.offline)
            .bind(event.free)
            .bind(event.event_status.as_str())
            .bind(event.manager_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Event>> {
        let query = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");

        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_all(&self, request: PageRequest) -> RepositoryResult<Page<Event>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await?;

        // Column names come from a closed set, never from the request text.
        let order_by = match request.sort {
            Some(sort) => {
                let direction = match sort.direction {
                    Direction::Asc => "ASC",
                    Direction::Desc => "DESC",
                };
                format!("{} {direction}, id ASC", sort.property.column())
            }
            None => "id ASC".to_string(),
        };
        let query = format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY {order_by} LIMIT $1 OFFSET $2"
        );

        let content = sqlx::query_as::<_, Event>(&query)
            .bind(i64::from(request.size))
            .bind(i64::try_from(request.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            content,
            request,
            total_elements: u64::try_from(total).unwrap_or_default(),
        })
    }
}

#[derive(FromRow)]
struct AccountRow {
    id: Uuid,
    email: String,
    password: String,
    roles: Vec<String>,
}

impl TryFrom<AccountRow> for Account {
    type Error = sqlx::Error;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let roles: BTreeSet<AccountRole> = row
            .roles
            .iter()
            .map(|role| role.parse::<AccountRole>())
            .collect::<Result<_, _>>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(Account {
            id: row.id,
            email: row.email,
            password: row.password,
            roles,
        })
    }
}

#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn save(&self, account: &Account) -> RepositoryResult<Account> {
        let roles: Vec<String> = account
            .roles
            .iter()
            .map(|role| role.as_str().to_string())
            .collect();

        let row = sqlx::query_as::<_, AccountRow>(
            "INSERT INTO accounts (id, email, password, roles) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (email) DO UPDATE SET \
                password = EXCLUDED.password, \
                roles = EXCLUDED.roles \
             RETURNING id, email, password, roles",
        )
        .bind(account.id)
        .bind(&account.email)
        .bind(&account.password)
        .bind(roles)
        .fetch_one(&self.pool)
        .await?;

        Account::try_from(row)
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT id, email, password, roles FROM accounts WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Account::try_from).transpose()
    }
}
