use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize, Serializer};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Draft,
    Published,
    BeganEnrollment,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "DRAFT",
            EventStatus::Published => "PUBLISHED",
            EventStatus::BeganEnrollment => "BEGAN_ENROLLMENT",
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown event status '{0}'")]
pub struct UnknownEventStatus(String);

impl TryFrom<String> for EventStatus {
    type Error = UnknownEventStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "DRAFT" => Ok(EventStatus::Draft),
            "PUBLISHED" => Ok(EventStatus::Published),
            "BEGAN_ENROLLMENT" => Ok(EventStatus::BeganEnrollment),
            _ => Err(UnknownEventStatus(value)),
        }
    }
}

/// A persisted event.
///
/// `free` and `offline` are derived from the prices and the location by
/// [`Event::update`] and are never taken from client input.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub begin_enrollment_date_time: NaiveDateTime,
    pub close_enrollment_date_time: NaiveDateTime,
    pub begin_event_date_time: NaiveDateTime,
    pub end_event_date_time: NaiveDateTime,
    pub location: Option<String>,
    pub base_price: i32,
    pub max_price: i32,
    pub limit_of_enrollment: i32,
    pub offline: bool,
    pub free: bool,
    #[sqlx(try_from = "String")]
    pub event_status: EventStatus,
    #[serde(
        rename = "manager",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_manager"
    )]
    pub manager_id: Option<Uuid>,
}

/// Only the manager's id leaves the server, never the account itself.
fn serialize_manager<S>(manager_id: &Option<Uuid>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    #[derive(Serialize)]
    struct ManagerRef<'a> {
        id: &'a Uuid,
    }

    match manager_id {
        Some(id) => serializer.serialize_some(&ManagerRef { id }),
        None => serializer.serialize_none(),
    }
}

impl Event {
    /// Creates a draft event managed by `manager_id` from validated input.
    pub fn new(input: &EventInput, manager_id: Uuid) -> Self {
        let mut event = Self {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            description: input.description.clone(),
            begin_enrollment_date_time: input.begin_enrollment_date_time,
            close_enrollment_date_time: input.close_enrollment_date_time,
            begin_event_date_time: input.begin_event_date_time,
            end_event_date_time: input.end_event_date_time,
            location: input.location.clone(),
            base_price: input.base_price,
            max_price: input.max_price,
            limit_of_enrollment: input.limit_of_enrollment,
            offline: false,
            free: false,
            event_status: EventStatus::Draft,
            manager_id: Some(manager_id),
        };
        event.update();
        event
    }

    /// Copies the client-writable fields onto the event and refreshes the
    /// derived flags.
    pub fn apply(&mut self, input: &EventInput) {
        self.name = input.name.clone();
        self.description = input.description.clone();
        self.begin_enrollment_date_time = input.begin_enrollment_date_time;
        self.close_enrollment_date_time = input.close_enrollment_date_time;
        self.begin_event_date_time = input.begin_event_date_time;
        self.end_event_date_time = input.end_event_date_time;
        self.location = input.location.clone();
        self.base_price = input.base_price;
        self.max_price = input.max_price;
        self.limit_of_enrollment = input.limit_of_enrollment;
        self.update();
    }

    pub fn update(&mut self) {
        self.free = self.base_price == 0 && self.max_price == 0;
        self.offline = self
            .location
            .as_deref()
            .is_some_and(|location| !location.trim().is_empty());
    }

    pub fn is_managed_by(&self, account_id: Uuid) -> bool {
        self.manager_id == Some(account_id)
    }
}

/// Request body for creating or updating an event.
///
/// Every field is optional so a partial body reports which fields are
/// missing instead of failing to parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventDto {
    pub name: Option<String>,
    pub description: Option<String>,
    pub begin_enrollment_date_time: Option<NaiveDateTime>,
    pub close_enrollment_date_time: Option<NaiveDateTime>,
    pub begin_event_date_time: Option<NaiveDateTime>,
    pub end_event_date_time: Option<NaiveDateTime>,
    pub location: Option<String>,
    pub base_price: Option<i32>,
    pub max_price: Option<i32>,
    pub limit_of_enrollment: Option<i32>,
}

impl From<&Event> for EventDto {
    fn from(event: &Event) -> Self {
        Self {
            name: Some(event.name.clone()),
            description: Some(event.description.clone()),
            begin_enrollment_date_time: Some(event.begin_enrollment_date_time),
            close_enrollment_date_time: Some(event.close_enrollment_date_time),
            begin_event_date_time: Some(event.begin_event_date_time),
            end_event_date_time: Some(event.end_event_date_time),
            location: event.location.clone(),
            base_price: Some(event.base_price),
            max_price: Some(event.max_price),
            limit_of_enrollment: Some(event.limit_of_enrollment),
        }
    }
}

/// An [`EventDto`] that passed field validation.
#[derive(Debug, Clone, PartialEq)]
pub struct EventInput {
    pub name: String,
    pub description: String,
    pub begin_enrollment_date_time: NaiveDateTime,
    pub close_enrollment_date_time: NaiveDateTime,
    pub begin_event_date_time: NaiveDateTime,
    pub end_event_date_time: NaiveDateTime,
    pub location: Option<String>,
    pub base_price: i32,
    pub max_price: i32,
    pub limit_of_enrollment: i32,
}
