//! Form validation
//!
//! Submitted forms arrive as plain strings. Each form type validates itself
//! into a typed input (`CreateUserInput`, `MemberInput`, `RecordInput`) or a
//! [`FormErrors`] map that the page re-renders next to the submitted values.
//!
//! Text fields are trimmed before any check; passwords are taken verbatim.

mod auth;
mod member;
mod record;

pub use auth::{LoginForm, RegisterForm};
pub use member::MemberForm;
pub use record::RecordForm;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub(crate) const REQUIRED: &str = "This field is required.";
pub(crate) const INVALID_DATE: &str = "Enter a valid date.";

/// Accepted date input shapes and their formats, tried in order.
///
/// chrono's `%Y` also takes one to three digit years, so the shape is checked
/// first: a four digit year for `%Y`, exactly two digits for `%y`.
static DATE_INPUT_FORMATS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"^\d{4}-\d{1,2}-\d{1,2}$", "%Y-%m-%d"),
        (r"^\d{1,2}/\d{1,2}/\d{4}$", "%m/%d/%Y"),
        (r"^\d{1,2}/\d{1,2}/\d{2}$", "%m/%d/%y"),
    ]
    .into_iter()
    .map(|(shape, format)| {
        (
            Regex::new(shape).expect("Failed to compile date shape regex"),
            format,
        )
    })
    .collect()
});

/// Validation errors keyed by field name, plus errors that belong to the
/// form as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
    non_field: Vec<String>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an error to `field`
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Attach an error to the form as a whole
    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    /// Errors of one field, empty when the field is valid
    pub fn get(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, field: &str) -> bool {
        !self.get(field).is_empty()
    }

    pub fn non_field_errors(&self) -> &[String] {
        &self.non_field
    }

    /// A single-field error set
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// `Ok(value)` when no error was collected
    pub fn finish<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for message in &self.non_field {
            if !first {
                f.write_str("; ")?;
            }
            f.write_str(message)?;
            first = false;
        }
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for FormErrors {}

/// Parse a date in any of the accepted input formats
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_INPUT_FORMATS
        .iter()
        .filter(|(shape, _)| shape.is_match(raw))
        .find_map(|(_, format)| NaiveDate::parse_from_str(raw, format).ok())
}

fn too_long(max: usize, len: usize) -> String {
    format!(
        "Ensure this value has at most {} characters (it has {}).",
        max, len
    )
}

/// Trimmed value of a mandatory text field no longer than `max` characters
pub(crate) fn required_text(
    errors: &mut FormErrors,
    field: &str,
    raw: &str,
    max: usize,
) -> String {
    let value = raw.trim();
    if value.is_empty() {
        errors.add(field, REQUIRED);
    } else {
        check_length(errors, field, value, max);
    }
    value.to_string()
}

/// Trimmed value of an optional text field no longer than `max` characters
pub(crate) fn optional_text(
    errors: &mut FormErrors,
    field: &str,
    raw: &str,
    max: usize,
) -> String {
    let value = raw.trim();
    check_length(errors, field, value, max);
    value.to_string()
}

fn check_length(errors: &mut FormErrors, field: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        errors.add(field, too_long(max, len));
    }
}

/// One value out of a fixed choice set.
///
/// An empty submission falls back to `default`, or is reported as missing
/// when there is no default.
pub(crate) fn choice<T: FromStr + Copy>(
    errors: &mut FormErrors,
    field: &str,
    raw: &str,
    default: Option<T>,
) -> Option<T> {
    let value = raw.trim();
    if value.is_empty() {
        if default.is_none() {
            errors.add(field, REQUIRED);
        }
        return default;
    }
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            errors.add(
                field,
                format!(
                    "Select a valid choice. {} is not one of the available choices.",
                    value
                ),
            );
            None
        }
    }
}

/// An optional date; blank means "not set"
pub(crate) fn optional_date(errors: &mut FormErrors, field: &str, raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    let parsed = parse_date(value);
    if parsed.is_none() {
        errors.add(field, INVALID_DATE);
    }
    parsed
}

/// A mandatory date
pub(crate) fn required_date(errors: &mut FormErrors, field: &str, raw: &str) -> Option<NaiveDate> {
    if raw.trim().is_empty() {
        errors.add(field, REQUIRED);
        return None;
    }
    optional_date(errors, field, raw)
}

/// Render an optional date the way `<input type="date">` expects it
pub(crate) fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}
