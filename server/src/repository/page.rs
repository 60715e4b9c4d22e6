use std::cmp::Ordering;

use crate::models::Event;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// Event properties a listing can be ordered by, named as they appear in
/// the JSON representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventProperty {
    Id,
    Name,
    Description,
    BeginEnrollmentDateTime,
    CloseEnrollmentDateTime,
    BeginEventDateTime,
    EndEventDateTime,
    Location,
    BasePrice,
    MaxPrice,
    LimitOfEnrollment,
    EventStatus,
}

impl EventProperty {
    pub fn from_name(name: &str) -> Option<Self> {
        let property = match name {
            "id" => Self::Id,
            "name" => Self::Name,
            "description" => Self::Description,
            "beginEnrollmentDateTime" => Self::BeginEnrollmentDateTime,
            "closeEnrollmentDateTime" => Self::CloseEnrollmentDateTime,
            "beginEventDateTime" => Self::BeginEventDateTime,
            "endEventDateTime" => Self::EndEventDateTime,
            "location" => Self::Location,
            "basePrice" => Self::BasePrice,
            "maxPrice" => Self::MaxPrice,
            "limitOfEnrollment" => Self::LimitOfEnrollment,
            "eventStatus" => Self::EventStatus,
            _ => return None,
        };
        Some(property)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Description => "description",
            Self::BeginEnrollmentDateTime => "beginEnrollmentDateTime",
            Self::CloseEnrollmentDateTime => "closeEnrollmentDateTime",
            Self::BeginEventDateTime => "beginEventDateTime",
            Self::EndEventDateTime => "endEventDateTime",
            Self::Location => "location",
            Self::BasePrice => "basePrice",
            Self::MaxPrice => "maxPrice",
            Self::LimitOfEnrollment => "limitOfEnrollment",
            Self::EventStatus => "eventStatus",
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Description => "description",
            Self::BeginEnrollmentDateTime => "begin_enrollment_date_time",
            Self::CloseEnrollmentDateTime => "close_enrollment_date_time",
            Self::BeginEventDateTime => "begin_event_date_time",
            Self::EndEventDateTime => "end_event_date_time",
            Self::Location => "location",
            Self::BasePrice => "base_price",
            Self::MaxPrice => "max_price",
            Self::LimitOfEnrollment => "limit_of_enrollment",
            Self::EventStatus => "event_status",
        }
    }

    /// Ascending order of two events on this property. Events without a
    /// location sort last, as PostgreSQL orders NULLs.
    pub fn compare(&self, a: &Event, b: &Event) -> Ordering {
        match self {
            Self::Id => a.id.cmp(&b.id),
            Self::Name => a.name.cmp(&b.name),
            Self::Description => a.description.cmp(&b.description),
            Self::BeginEnrollmentDateTime => a
                .begin_enrollment_date_time
                .cmp(&b.begin_enrollment_date_time),
            Self::CloseEnrollmentDateTime => a
                .close_enrollment_date_time
                .cmp(&b.close_enrollment_date_time),
            Self::BeginEventDateTime => a.begin_event_date_time.cmp(&b.begin_event_date_time),
            Self::EndEventDateTime => a.end_event_date_time.cmp(&b.end_event_date_time),
            Self::Location => match (&a.location, &b.location) {
                (Some(a), Some(b)) => a.cmp(b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            Self::BasePrice => a.base_price.cmp(&b.base_price),
            Self::MaxPrice => a.max_price.cmp(&b.max_price),
            Self::LimitOfEnrollment => a.limit_of_enrollment.cmp(&b.limit_of_enrollment),
            Self::EventStatus => a.event_status.as_str().cmp(b.event_status.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub property: EventProperty,
    pub direction: Direction,
}

impl Sort {
    /// Parses `property[,asc|desc]`. Returns `None` for unknown properties
    /// or directions.
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.split(',').map(str::trim);
        let property = EventProperty::from_name(parts.next()?)?;
        let direction = match parts.next() {
            None | Some("") => Direction::Asc,
            Some(direction) if direction.eq_ignore_ascii_case("asc") => Direction::Asc,
            Some(direction) if direction.eq_ignore_ascii_case("desc") => Direction::Desc,
            Some(_) => return None,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            property,
            direction,
        })
    }

    pub fn compare(&self, a: &Event, b: &Event) -> Ordering {
        let ordering = self.property.compare(a, b);
        match self.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }

    /// Query-string form, e.g. `name,desc`.
    pub fn to_param(&self) -> String {
        format!("{},{}", self.property.name(), self.direction.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Zero-based page index.
    pub page: u32,
    pub size: u32,
    pub sort: Option<Sort>,
}

impl PageRequest {
    pub fn new(page: u32, size: u32, sort: Option<Sort>) -> Self {
        Self {
            page,
            size: size.clamp(1, MAX_PAGE_SIZE),
            sort,
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }

    pub fn with_page(&self, page: u32) -> Self {
        Self { page, ..*self }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE, None)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub request: PageRequest,
    pub total_elements: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u32 {
        let size = u64::from(self.request.size);
        u32::try_from(self.total_elements.div_ceil(size)).unwrap_or(u32::MAX)
    }

    pub fn number(&self) -> u32 {
        self.request.page
    }

    pub fn has_previous(&self) -> bool {
        self.request.page > 0
    }

    pub fn has_next(&self) -> bool {
        self.next_page().is_some()
    }

    /// Index of the following page, if there is one.
    pub fn next_page(&self) -> Option<u32> {
        self.request
            .page
            .checked_add(1)
            .filter(|next| *next < self.total_pages())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_parses_property_and_direction() {
        let sort = Sort::parse("name,DESC").unwrap();
        assert_eq!(sort.property, EventProperty::Name);
        assert_eq!(sort.direction, Direction::Desc);
        assert_eq!(sort.to_param(), "name,desc");

        let sort = Sort::parse("basePrice").unwrap();
        assert_eq!(sort.direction, Direction::Asc);
    }

    #[test]
    fn test_sort_rejects_unknown_input() {
        assert!(Sort::parse("password").is_none());
        assert!(Sort::parse("name,sideways").is_none());
        assert!(Sort::parse("name,asc,extra").is_none());
        assert!(Sort::parse("").is_none());
    }

    #[test]
    fn test_page_request_clamps_size() {
        assert_eq!(PageRequest::new(0, 0, None).size, 1);
        assert_eq!(PageRequest::new(0, 10_000, None).size, MAX_PAGE_SIZE);
        assert_eq!(PageRequest::new(3, 10, None).offset(), 30);
    }

    #[test]
    fn test_page_navigation() {
        let page = Page::<()> {
            content: Vec::new(),
            request: PageRequest::new(1, 2, None),
            total_elements: 30,
        };
        assert_eq!(page.total_pages(), 15);
        assert!(page.has_previous());
        assert!(page.has_next());

        let last = Page::<()> {
            request: PageRequest::new(14, 2, None),
            ..page.clone()
        };
        assert!(!last.has_next());

        let beyond = Page::<()> {
            request: PageRequest::new(u32::MAX, 2, None),
            ..page.clone()
        };
        assert!(!beyond.has_next());
        assert!(beyond.next_page().is_none());

        let empty = Page::<()> {
            content: Vec::new(),
            request: PageRequest::default(),
            total_elements: 0,
        };
        assert_eq!(empty.total_pages(), 0);
        assert!(!empty.has_previous());
        assert!(!empty.has_next());
    }
}
