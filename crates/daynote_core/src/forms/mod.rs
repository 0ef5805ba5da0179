//! Form validation for note, login and registration submissions.
//!
//! # Responsibility
//! - Turn raw submitted strings into cleaned, typed values.
//! - Report every problem as a per-field message instead of failing.
//!
//! # Invariants
//! - `validate` never panics and never touches storage.
//! - Text fields are trimmed before length checks; secrets are not.

use serde::Serialize;
use std::collections::BTreeMap;

pub mod auth_forms;
pub mod note_form;

/// Key under which non-field errors are reported.
pub const NON_FIELD_ERRORS: &str = "__all__";

pub(crate) const MSG_REQUIRED: &str = "This field is required.";
pub(crate) const MSG_NOT_INTEGER: &str = "Enter a whole number.";

/// A form variant that validates a fixed field set.
pub trait Form {
    type Cleaned;

    fn validate(&self) -> Result<Self::Cleaned, FormErrors>;
}

/// Field-level validation messages, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors {
    #[serde(flatten)]
    fields: BTreeMap<String, Vec<String>>,
    #[serde(rename = "__all__", skip_serializing_if = "Vec::is_empty")]
    non_field: Vec<String>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message against `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Records a message that is not tied to one field.
    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    /// Messages recorded for `field`; empty when the field is valid.
    pub fn field(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn non_field(&self) -> &[String] {
        &self.non_field
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }
}

/// Required, trimmed text limited to `max_chars` characters.
pub(crate) fn clean_required_text(
    errors: &mut FormErrors,
    field: &str,
    raw: Option<&str>,
    max_chars: usize,
) -> Option<String> {
    let value = raw.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        errors.add(field, MSG_REQUIRED);
        return None;
    }

    let length = value.chars().count();
    if length > max_chars {
        errors.add(
            field,
            format!("Ensure this value has at most {max_chars} characters (it has {length})."),
        );
        return None;
    }
    Some(value.to_string())
}

/// Required secret, kept verbatim (no trimming).
pub(crate) fn clean_required_secret(
    errors: &mut FormErrors,
    field: &str,
    raw: Option<&str>,
) -> Option<String> {
    match raw {
        Some(value) if !value.is_empty() => Some(value.to_string()),
        _ => {
            errors.add(field, MSG_REQUIRED);
            None
        }
    }
}

/// Required 32-bit integer.
pub(crate) fn clean_required_integer(
    errors: &mut FormErrors,
    field: &str,
    raw: Option<&str>,
) -> Option<i32> {
    match clean_optional_integer(errors, field, raw) {
        Some(Some(value)) => Some(value),
        Some(None) => {
            errors.add(field, MSG_REQUIRED);
            None
        }
        None => None,
    }
}

/// Optional 32-bit integer. `Some(None)` means the field was left blank,
/// `None` means an error was recorded.
pub(crate) fn clean_optional_integer(
    errors: &mut FormErrors,
    field: &str,
    raw: Option<&str>,
) -> Option<Option<i32>> {
    let value = raw.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Some(None);
    }

    match parse_integer(value) {
        Ok(parsed) => Some(Some(parsed)),
        Err(message) => {
            errors.add(field, message);
            None
        }
    }
}

fn parse_integer(value: &str) -> Result<i32, String> {
    // Accept a trailing `.0`, `.00`, ... the way HTML number inputs may send it.
    let digits = match value.split_once('.') {
        Some((whole, fraction)) if fraction.chars().all(|c| c == '0') => whole,
        Some(_) => return Err(MSG_NOT_INTEGER.to_string()),
        None => value,
    };
    let magnitude = digits.strip_prefix(['+', '-']).unwrap_or(digits);
    if magnitude.is_empty() || !magnitude.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MSG_NOT_INTEGER.to_string());
    }

    let negative = digits.starts_with('-');
    match digits.parse::<i32>() {
        Ok(value) => Ok(value),
        Err(_) if negative => Err(format!(
            "Ensure this value is greater than or equal to {}.",
            i32::MIN
        )),
        Err(_) => Err(format!(
            "Ensure this value is less than or equal to {}.",
            i32::MAX
        )),
    }
}
