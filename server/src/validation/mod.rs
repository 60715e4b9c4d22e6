//! Validation error accumulation.
//!
//! Validators never fail fast: they push every violation they find onto a
//! [`ValidationErrors`] and the caller decides what to do once they are done.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

pub mod event;

pub use event::{read_body, validate_event, validate_fields, EventValidator};

/// A violation tied to a single input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub code: String,
    pub default_message: String,
    pub rejected_value: Option<String>,
}

/// A violation spanning several fields or the request as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalError {
    pub code: String,
    pub default_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    object_name: String,
    field_errors: Vec<FieldError>,
    global_errors: Vec<GlobalError>,
}

impl ValidationErrors {
    pub fn new(object_name: impl Into<String>) -> Self {
        Self {
            object_name: object_name.into(),
            field_errors: Vec::new(),
            global_errors: Vec::new(),
        }
    }

    pub fn reject_value(
        &mut self,
        field: &str,
        code: &str,
        default_message: impl Into<String>,
        rejected_value: Option<String>,
    ) {
        self.field_errors.push(FieldError {
            field: field.to_string(),
            code: code.to_string(),
            default_message: default_message.into(),
            rejected_value,
        });
    }

    pub fn reject(&mut self, code: &str, default_message: impl Into<String>) {
        self.global_errors.push(GlobalError {
            code: code.to_string(),
            default_message: default_message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.field_errors.is_empty() || !self.global_errors.is_empty()
    }

    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    pub fn global_errors(&self) -> &[GlobalError] {
        &self.global_errors
    }

    pub fn field_error(&self, field: &str) -> Option<&FieldError> {
        self.field_errors.iter().find(|error| error.field == field)
    }

    pub fn len(&self) -> usize {
        self.field_errors.len() + self.global_errors.len()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_errors()
    }

    /// `Ok(())` when nothing was rejected, otherwise the accumulated errors.
    pub fn into_result(self) -> Result<(), Self> {
        if self.has_errors() {
            Err(self)
        } else {
            Ok(())
        }
    }
}

/// Serialized as a flat array: field errors first, then global errors.
impl Serialize for ValidationErrors {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for error in &self.field_errors {
            seq.serialize_element(&FieldErrorView {
                object_name: &self.object_name,
                error,
            })?;
        }
        for error in &self.global_errors {
            seq.serialize_element(&GlobalErrorView {
                object_name: &self.object_name,
                error,
            })?;
        }
        seq.end()
    }
}

struct FieldErrorView<'a> {
    object_name: &'a str,
    error: &'a FieldError,
}

impl Serialize for FieldErrorView<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("objectName", self.object_name)?;
        map.serialize_entry("field", &self.error.field)?;
        map.serialize_entry("code", &self.error.code)?;
        map.serialize_entry("defaultMessage", &self.error.default_message)?;
        if let Some(rejected_value) = &self.error.rejected_value {
            map.serialize_entry("rejectedValue", rejected_value)?;
        }
        map.end()
    }
}

struct GlobalErrorView<'a> {
    object_name: &'a str,
    error: &'a GlobalError,
}

impl Serialize for GlobalErrorView<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("objectName", self.object_name)?;
        map.serialize_entry("code", &self.error.code)?;
        map.serialize_entry("defaultMessage", &self.error.default_message)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_accumulator_has_no_errors() {
        let errors = ValidationErrors::new("eventDto");
        assert!(!errors.has_errors());
        assert!(errors.into_result().is_ok());
    }

    #[test]
    fn test_serializes_field_errors_before_global_errors() {
        let mut errors = ValidationErrors::new("eventDto");
        errors.reject("wrongDateTime", "endEventDateTime is before beginEventDateTime");
        errors.reject_value(
            "basePrice",
            "wrongValue",
            "basePrice must not exceed maxPrice",
            Some("300".to_string()),
        );
        errors.reject_value("name", "NotEmpty", "must not be empty", None);

        let value = serde_json::to_value(&errors).unwrap();

        assert_eq!(
            value,
            json!([
                {
                    "objectName": "eventDto",
                    "field": "basePrice",
                    "code": "wrongValue",
                    "defaultMessage": "basePrice must not exceed maxPrice",
                    "rejectedValue": "300"
                },
                {
                    "objectName": "eventDto",
                    "field": "name",
                    "code": "NotEmpty",
                    "defaultMessage": "must not be empty"
                },
                {
                    "objectName": "eventDto",
                    "code": "wrongDateTime",
                    "defaultMessage": "endEventDateTime is before beginEventDateTime"
                }
            ])
        );
    }
}
