use chrono::NaiveDateTime;

use crate::models::{EventDto, EventInput};
use crate::validation::ValidationErrors;

pub const OBJECT_NAME: &str = "eventDto";

const NOT_EMPTY: &str = "NotEmpty";
const NOT_NULL: &str = "NotNull";
const MIN: &str = "Min";
const WRONG_VALUE: &str = "wrongValue";
const WRONG_DATE_TIME: &str = "wrongDateTime";
const NOT_READABLE: &str = "NotReadable";

/// Reads a request body as an [`EventDto`]. An empty body is an empty DTO;
/// malformed JSON is a global error.
pub fn read_body(body: &[u8]) -> Result<EventDto, ValidationErrors> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(EventDto::default());
    }

    serde_json::from_slice(body).map_err(|e| {
        let mut errors = ValidationErrors::new(OBJECT_NAME);
        errors.reject(NOT_READABLE, format!("Malformed request body: {e}"));
        errors
    })
}

/// Runs both validation passes. Business rules only run once every field
/// is present and in range.
pub fn validate_event(dto: EventDto) -> Result<EventInput, ValidationErrors> {
    let input = validate_fields(dto)?;
    let mut errors = ValidationErrors::new(OBJECT_NAME);
    EventValidator.validate(&input, &mut errors);
    errors.into_result().map(|()| input)
}

/// Field-level checks on a raw request body.
///
/// Every rule runs so the client sees all missing or out-of-range fields at
/// once. Absent prices and enrollment limits count as `0`.
pub fn validate_fields(dto: EventDto) -> Result<EventInput, ValidationErrors> {
    let mut errors = ValidationErrors::new(OBJECT_NAME);

    let name = required_text(&mut errors, "name", dto.name);
    let description = required_text(&mut errors, "description", dto.description);
    let begin_enrollment = required_time(
        &mut errors,
        "beginEnrollmentDateTime",
        dto.begin_enrollment_date_time,
    );
    let close_enrollment = required_time(
        &mut errors,
        "closeEnrollmentDateTime",
        dto.close_enrollment_date_time,
    );
    let begin_event = required_time(&mut errors, "beginEventDateTime", dto.begin_event_date_time);
    let end_event = required_time(&mut errors, "endEventDateTime", dto.end_event_date_time);
    let base_price = non_negative(&mut errors, "basePrice", dto.base_price);
    let max_price = non_negative(&mut errors, "maxPrice", dto.max_price);
    let limit_of_enrollment = non_negative(&mut errors, "limitOfEnrollment", dto.limit_of_enrollment);

    match (
        name,
        description,
        begin_enrollment,
        close_enrollment,
        begin_event,
        end_event,
    ) {
        (
            Some(name),
            Some(description),
            Some(begin_enrollment_date_time),
            Some(close_enrollment_date_time),
            Some(begin_event_date_time),
            Some(end_event_date_time),
        ) if !errors.has_errors() => Ok(EventInput {
            name,
            description,
            begin_enrollment_date_time,
            close_enrollment_date_time,
            begin_event_date_time,
            end_event_date_time,
            location: dto.location,
            base_price,
            max_price,
            limit_of_enrollment,
        }),
        _ => Err(errors),
    }
}

fn required_text(errors: &mut ValidationErrors, field: &str, value: Option<String>) -> Option<String> {
    match value {
        Some(text) if !text.trim().is_empty() => Some(text),
        _ => {
            errors.reject_value(field, NOT_EMPTY, "must not be empty", None);
            None
        }
    }
}

fn required_time(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<NaiveDateTime>,
) -> Option<NaiveDateTime> {
    if value.is_none() {
        errors.reject_value(field, NOT_NULL, "must not be null", None);
    }
    value
}

fn non_negative(errors: &mut ValidationErrors, field: &str, value: Option<i32>) -> i32 {
    let value = value.unwrap_or(0);
    if value < 0 {
        errors.reject_value(
            field,
            MIN,
            "must be greater than or equal to 0",
            Some(value.to_string()),
        );
    }
    value
}

/// Business rules that relate several fields of an event to each other.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventValidator;

impl EventValidator {
    pub fn validate(&self, input: &EventInput, errors: &mut ValidationErrors) {
        // A max price of 0 means the price has no upper bound.
        if input.max_price > 0 && input.base_price > input.max_price {
            errors.reject_value(
                "basePrice",
                WRONG_VALUE,
                "basePrice must not be greater than maxPrice",
                Some(input.base_price.to_string()),
            );
        }

        let ordering = [
            (
                input.close_enrollment_date_time < input.begin_enrollment_date_time,
                "closeEnrollmentDateTime is before beginEnrollmentDateTime",
            ),
            (
                input.begin_event_date_time < input.close_enrollment_date_time,
                "beginEventDateTime is before closeEnrollmentDateTime",
            ),
            (
                input.end_event_date_time < input.begin_event_date_time,
                "endEventDateTime is before beginEventDateTime",
            ),
            (
                input.end_event_date_time < input.close_enrollment_date_time,
                "endEventDateTime is before closeEnrollmentDateTime",
            ),
            (
                input.end_event_date_time < input.begin_enrollment_date_time,
                "endEventDateTime is before beginEnrollmentDateTime",
            ),
        ];

        for (violated, message) in ordering {
            if violated {
                errors.reject(WRONG_DATE_TIME, message);
            }
        }
    }
}
