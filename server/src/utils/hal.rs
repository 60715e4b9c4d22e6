//! Hypermedia (HAL) representations.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::repository::Page;
use crate::validation::ValidationErrors;

pub const HAL_JSON: &str = "application/hal+json";

pub const INDEX_PATH: &str = "/api";
pub const EVENTS_PATH: &str = "/api/events";

const PROFILE_BASE: &str = "/docs/index.html";

pub mod rel {
    pub const SELF: &str = "self";
    pub const PROFILE: &str = "profile";
    pub const INDEX: &str = "index";
    pub const EVENTS: &str = "events";
    pub const GET_EVENT_LIST: &str = "get-event-list";
    pub const UPDATE_EVENT: &str = "update-event";
    pub const FIRST: &str = "first";
    pub const PREV: &str = "prev";
    pub const NEXT: &str = "next";
    pub const LAST: &str = "last";
}

/// Documentation anchor for a resource, e.g. `/docs/index.html#resources-get-event`.
pub fn profile_href(resource: &str) -> String {
    format!("{PROFILE_BASE}#resources-{resource}")
}

pub fn event_href(id: impl std::fmt::Display) -> String {
    format!("{EVENTS_PATH}/{id}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub href: String,
}

/// Links keyed by relation, serialized in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Links(Vec<(&'static str, Link)>);

impl Links {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, rel: &'static str, href: impl Into<String>) -> Self {
        self.add(rel, href);
        self
    }

    /// Adds or replaces the link for `rel`.
    pub fn add(&mut self, rel: &'static str, href: impl Into<String>) {
        let link = Link { href: href.into() };
        match self.0.iter_mut().find(|(existing, _)| *existing == rel) {
            Some((_, existing)) => *existing = link,
            None => self.0.push((rel, link)),
        }
    }

    pub fn get(&self, rel: &str) -> Option<&Link> {
        self.0
            .iter()
            .find(|(existing, _)| *existing == rel)
            .map(|(_, link)| link)
    }

    pub fn has(&self, rel: &str) -> bool {
        self.get(rel).is_some()
    }
}

impl Serialize for Links {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (rel, link) in &self.0 {
            map.serialize_entry(rel, link)?;
        }
        map.end()
    }
}

/// A resource with nothing but links, such as the API index.
#[derive(Debug, Clone, Serialize)]
pub struct RepresentationModel {
    #[serde(rename = "_links")]
    pub links: Links,
}

/// A single resource: its own fields followed by `_links`.
#[derive(Debug, Clone, Serialize)]
pub struct EntityModel<T> {
    #[serde(flatten)]
    pub content: T,
    #[serde(rename = "_links")]
    pub links: Links,
}

impl<T> EntityModel<T> {
    pub fn new(content: T, links: Links) -> Self {
        Self { content, links }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
    pub number: u32,
}

impl<T> From<&Page<T>> for PageMetadata {
    fn from(page: &Page<T>) -> Self {
        Self {
            size: page.request.size,
            total_elements: page.total_elements,
            total_pages: page.total_pages(),
            number: page.number(),
        }
    }
}

/// A page of embedded resources. `_embedded` is left out when the page is
/// empty.
#[derive(Debug, Clone, Serialize)]
pub struct PagedModel<T> {
    #[serde(rename = "_embedded", skip_serializing_if = "Option::is_none")]
    pub embedded: Option<BTreeMap<&'static str, Vec<T>>>,
    #[serde(rename = "_links")]
    pub links: Links,
    pub page: PageMetadata,
}

impl<T> PagedModel<T> {
    pub fn new(collection: &'static str, items: Vec<T>, links: Links, page: PageMetadata) -> Self {
        let embedded = if items.is_empty() {
            None
        } else {
            Some(BTreeMap::from([(collection, items)]))
        };
        Self {
            embedded,
            links,
            page,
        }
    }
}

/// Body of a 400 response: the rejected errors plus a way back to the index.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorModel {
    pub content: ValidationErrors,
    #[serde(rename = "_links")]
    pub links: Links,
}

impl From<ValidationErrors> for ErrorModel {
    fn from(errors: ValidationErrors) -> Self {
        Self {
            content: errors,
            links: Links::new().with(rel::INDEX, INDEX_PATH),
        }
    }
}
