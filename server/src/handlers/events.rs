use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::auth::CurrentAccount;
use crate::models::Event;
use crate::repository::page::DEFAULT_PAGE_SIZE;
use crate::repository::{Page, PageRequest, Sort};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::hal::{
    event_href, profile_href, rel, EntityModel, Links, PageMetadata, PagedModel, EVENTS_PATH,
};
use crate::utils::response::{created, Hal};
use crate::validation::event::OBJECT_NAME;
use crate::validation::{read_body, validate_event, ValidationErrors};

const EVENT_LIST: &str = "eventList";

const CREATE_EVENT_DOCS: &str = "create-event";
const GET_EVENT_DOCS: &str = "get-event";
const GET_EVENT_LIST_DOCS: &str = "get-event-list";
const UPDATE_EVENT_DOCS: &str = "update-event";

/// Paging parameters of `GET /api/events`. Values that do not parse fall
/// back to the defaults, except `sort`, which is rejected. Only the first
/// occurrence of each parameter counts.
#[derive(Debug, Default)]
struct ListParams {
    page: Option<String>,
    size: Option<String>,
    sort: Option<String>,
}

impl ListParams {
    fn from_query(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "page" => &mut params.page,
                "size" => &mut params.size,
                "sort" => &mut params.sort,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        params
    }

    fn page_request(&self) -> Result<PageRequest, AppError> {
        let page = parse_number(self.page.as_deref()).unwrap_or(0);
        let size = parse_number(self.size.as_deref())
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        let sort = match self.sort.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) => Some(Sort::parse(value).ok_or_else(|| {
                let mut errors = ValidationErrors::new(OBJECT_NAME);
                errors.reject("invalidSort", format!("Cannot sort events by '{value}'"));
                AppError::from(errors)
            })?),
        };

        Ok(PageRequest::new(page, size, sort))
    }
}

fn parse_number(value: Option<&str>) -> Option<u32> {
    value.and_then(|value| value.trim().parse().ok())
}

fn page_href(request: &PageRequest) -> String {
    let mut href = format!("{EVENTS_PATH}?page={}&size={}", request.page, request.size);
    if let Some(sort) = request.sort {
        href.push_str("&sort=");
        href.push_str(&sort.to_param());
    }
    href
}

fn page_links<T>(page: &Page<T>) -> Links {
    let request = page.request;
    let total_pages = page.total_pages();
    let mut links = Links::new();

    if total_pages > 1 {
        links.add(rel::FIRST, page_href(&request.with_page(0)));
    }
    if page.has_previous() {
        links.add(rel::PREV, page_href(&request.with_page(request.page - 1)));
    }
    links.add(rel::SELF, page_href(&request));
    if let Some(next) = page.next_page() {
        links.add(rel::NEXT, page_href(&request.with_page(next)));
    }
    if total_pages > 1 {
        links.add(rel::LAST, page_href(&request.with_page(total_pages - 1)));
    }
    links.add(rel::PROFILE, profile_href(GET_EVENT_LIST_DOCS));
    links
}

fn parse_event_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| not_found(id))
}

fn not_found(id: impl std::fmt::Display) -> AppError {
    AppError::NotFound(format!("Event '{id}' was not found"))
}

pub async fn create_event(
    State(state): State<AppState>,
    CurrentAccount(manager): CurrentAccount,
    body: Bytes,
) -> Result<Response, AppError> {
    let input = validate_event(read_body(&body)?)?;

    let event = state.events.save(&Event::new(&input, manager.id)).await?;
    tracing::info!(event_id = %event.id, manager = %manager.email, "Event created");

    let location = event_href(event.id);
    let links = Links::new()
        .with(rel::SELF, location.clone())
        .with(rel::GET_EVENT_LIST, EVENTS_PATH)
        .with(rel::UPDATE_EVENT, location.clone())
        .with(rel::PROFILE, profile_href(CREATE_EVENT_DOCS));

    Ok(created(&location, EntityModel::new(event, links)))
}

pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let request = ListParams::from_query(query).page_request()?;
    let page = state.events.find_all(request).await?;

    let links = page_links(&page);
    let metadata = PageMetadata::from(&page);
    let events = page
        .content
        .into_iter()
        .map(|event| {
            let links = Links::new().with(rel::SELF, event_href(event.id));
            EntityModel::new(event, links)
        })
        .collect();

    Ok(Hal(PagedModel::new(EVENT_LIST, events, links, metadata)).into_response())
}

pub async fn get_event(
    State(state): State<AppState>,
    caller: Option<CurrentAccount>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_event_id(&id)?;
    let event = state
        .events
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let href = event_href(event.id);
    let mut links = Links::new().with(rel::SELF, href.clone());
    if caller.is_some_and(|CurrentAccount(account)| event.is_managed_by(account.id)) {
        links.add(rel::UPDATE_EVENT, href);
    }
    links.add(rel::PROFILE, profile_href(GET_EVENT_DOCS));

    Ok(Hal(EntityModel::new(event, links)).into_response())
}

/// Only the manager may update. Ownership is checked before the body is
/// validated.
pub async fn update_event(
    State(state): State<AppState>,
    CurrentAccount(caller): CurrentAccount,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, AppError> {
    let id = parse_event_id(&id)?;
    let mut event = state
        .events
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found(id))?;

    if !event.is_managed_by(caller.id) {
        return Err(AppError::AuthError(format!(
            "Event '{id}' is not managed by the caller"
        )));
    }

    let input = validate_event(read_body(&body)?)?;
    event.apply(&input);
    let event = state.events.save(&event).await?;
    tracing::info!(event_id = %event.id, manager = %caller.email, "Event updated");

    let links = Links::new()
        .with(rel::SELF, event_href(event.id))
        .with(rel::PROFILE, profile_href(UPDATE_EVENT_DOCS));

    Ok(Hal(EntityModel::new(event, links)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<&str>, size: Option<&str>, sort: Option<&str>) -> ListParams {
        ListParams {
            page: page.map(str::to_string),
            size: size.map(str::to_string),
            sort: sort.map(str::to_string),
        }
    }

    #[test]
    fn test_page_request_defaults() {
        let request = params(None, None, None).page_request().unwrap();
        assert_eq!(request, PageRequest::default());

        let request = params(Some("abc"), Some("0"), Some(" ")).page_request().unwrap();
        assert_eq!(request, PageRequest::default());
    }

    #[test]
    fn test_first_sort_parameter_wins() {
        let query = vec![
            ("sort".to_string(), "name,desc".to_string()),
            ("sort".to_string(), "basePrice".to_string()),
            ("size".to_string(), "5".to_string()),
        ];

        let request = ListParams::from_query(query).page_request().unwrap();

        assert_eq!(request.sort, Sort::parse("name,desc"));
        assert_eq!(request.size, 5);
    }

    #[test]
    fn test_unknown_sort_is_a_validation_error() {
        let err = params(None, None, Some("password,asc"))
            .page_request()
            .unwrap_err();

        match err {
            AppError::Validation(errors) => {
                assert_eq!(errors.global_errors()[0].code, "invalidSort");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_page_links_on_a_middle_page() {
        let page = Page::<()> {
            content: Vec::new(),
            request: PageRequest::new(1, 10, Sort::parse("name,desc")),
            total_elements: 30,
        };

        let links = page_links(&page);

        assert_eq!(
            links.get(rel::FIRST).unwrap().href,
            "/api/events?page=0&size=10&sort=name,desc"
        );
        assert_eq!(
            links.get(rel::PREV).unwrap().href,
            "/api/events?page=0&size=10&sort=name,desc"
        );
        assert_eq!(
            links.get(rel::NEXT).unwrap().href,
            "/api/events?page=2&size=10&sort=name,desc"
        );
        assert_eq!(
            links.get(rel::LAST).unwrap().href,
            "/api/events?page=2&size=10&sort=name,desc"
        );
        assert!(links.has(rel::PROFILE));
    }

    #[test]
    fn test_single_page_has_only_self_and_profile() {
        let page = Page::<()> {
            content: Vec::new(),
            request: PageRequest::default(),
            total_elements: 3,
        };

        let links = serde_json::to_value(page_links(&page)).unwrap();
        let rels: Vec<&String> = links.as_object().unwrap().keys().collect();

        assert_eq!(rels, ["profile", "self"]);
    }

    #[test]
    fn test_malformed_id_is_not_found() {
        assert!(matches!(parse_event_id("42"), Err(AppError::NotFound(_))));
        assert!(parse_event_id(&Uuid::new_v4().to_string()).is_ok());
    }
}
