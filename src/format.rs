//! Display formatting for job fields.
//!
//! Formatting is total: every field and every value shape yields a string.
//! Dates that cannot be parsed are shown exactly as stored.

use std::fmt::Write;

use serde_json::Value;

use crate::domain::Job;
use crate::fields::{FieldValue, JobField};

/// Date pattern used when no format is configured.
pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Clone)]
pub struct Formatter {
    date_format: String,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMAT)
    }
}

impl Formatter {
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            date_format: date_format.into(),
        }
    }

    pub fn format_field(&self, job: &Job, field: JobField) -> String {
        self.format_value(&field.value(job))
    }

    /// Format by string key. Unknown keys render as an empty string.
    pub fn format_field_key(&self, job: &Job, key: &str) -> String {
        JobField::from_key(key)
            .map(|field| self.format_field(job, field))
            .unwrap_or_default()
    }

    /// Format one field of an untyped JSON document.
    pub fn format_document_field(&self, document: &Value, key: &str) -> String {
        let value = document.get(key).unwrap_or(&Value::Null);
        self.format_value(&FieldValue::from_json(value))
    }

    pub fn format_value(&self, value: &FieldValue<'_>) -> String {
        match value {
            FieldValue::Null => String::new(),
            FieldValue::Text(text) => text.to_string(),
            FieldValue::List(items) => items.join(", "),
            FieldValue::Date(date) => match date.to_datetime() {
                Some(instant) => {
                    let mut rendered = String::new();
                    // chrono reports a bad pattern as a fmt::Error
                    match write!(rendered, "{}", instant.format(&self.date_format)) {
                        Ok(()) => rendered,
                        Err(_) => date.to_raw_string(),
                    }
                }
                None => date.to_raw_string(),
            },
            FieldValue::Json(value) => value.to_string(),
        }
    }
}

/// Format a field with the default date pattern.
pub fn format_field(job: &Job, field: JobField) -> String {
    Formatter::default().format_field(job, field)
}
