//! User field validation utilities

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use validator::ValidateEmail;

pub const MAX_NAME_LENGTH: usize = 50;
pub const MAX_ADDRESS_LENGTH: usize = 50;
pub const MAX_EMAIL_LENGTH: usize = 50;
pub const MAX_AREA_CODE_LENGTH: usize = 5;
pub const MAX_PHONE_NUMBER_LENGTH: usize = 20;

/// Accepted postal code formats, tried in order
static POSTAL_CODE_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        // Colombia
        ("CO", r"^\d{6}$"),
        ("US", r"^\d{5}(-\d{4})?$"),
        ("BR", r"^\d{5}-\d{3}$"),
        ("CA", r"(?i)^[ABCEGHJKLMNPRSTVXY]\d[ABCEGHJ-NPRSTV-Z][\s-]?\d[ABCEGHJ-NPRSTV-Z]\d$"),
        ("GB", r"(?i)^(gir\s?0aa|[a-z]{1,2}\d[\da-z]?\s?\d[a-z]{2})$"),
        ("NL", r"(?i)^\d{4}\s?[a-z]{2}$"),
        ("JP", r"^\d{3}-\d{4}$"),
        ("generic", r"^\d{3,7}$"),
    ]
    .into_iter()
    .map(|(locale, pattern)| (locale, Regex::new(pattern).unwrap()))
    .collect()
});

/// What kind of rule a field violated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "rule")]
pub enum FieldErrorKind {
    Required,
    InvalidEmail,
    InvalidPostalCode,
    TooLong { max: usize },
    Mismatch,
    /// Value could not be read as the field's type
    Malformed,
}

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub kind: FieldErrorKind,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, kind: FieldErrorKind, message: impl Into<String>) -> Self {
        Self {
            field,
            kind,
            message: message.into(),
        }
    }

    pub fn required(field: &'static str, message: impl Into<String>) -> Self {
        Self::new(field, FieldErrorKind::Required, message)
    }

    pub fn too_long(field: &'static str, label: &str, max: usize) -> Self {
        Self::new(
            field,
            FieldErrorKind::TooLong { max },
            format!("{} exceeds maximum length of {} characters", label, max),
        )
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Collects field errors across a whole candidate
#[derive(Debug, Default)]
pub(crate) struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub(crate) fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    /// Record a missing-value error and hand back the trimmed value
    pub(crate) fn require_text<'a>(
        &mut self,
        field: &'static str,
        value: Option<&'a str>,
        message: &str,
    ) -> Option<&'a str> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Some(v),
            _ => {
                self.push(FieldError::required(field, message));
                None
            }
        }
    }

    pub(crate) fn require<T>(&mut self, field: &'static str, value: Option<T>, message: &str) -> Option<T> {
        if value.is_none() {
            self.push(FieldError::required(field, message));
        }
        value
    }

    pub(crate) fn max_length(&mut self, field: &'static str, label: &str, value: Option<&str>, max: usize) {
        if let Some(v) = value {
            if exceeds(v, max) {
                self.push(FieldError::too_long(field, label, max));
            }
        }
    }

    pub(crate) fn into_vec(self) -> Vec<FieldError> {
        self.0
    }

    pub(crate) fn into_result(self) -> Result<(), Vec<FieldError>> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self.0)
        }
    }
}

fn exceeds(value: &str, max: usize) -> bool {
    value.chars().count() > max
}

/// Check an email address format
pub fn is_valid_email(email: &str) -> bool {
    email.to_string().validate_email()
}

/// Check a postal code against the supported national formats
pub fn is_valid_postal_code(code: &str) -> bool {
    postal_code_locale(code).is_some()
}

/// Return the first format that matches the postal code
pub fn postal_code_locale(code: &str) -> Option<&'static str> {
    let code = code.trim();

    POSTAL_CODE_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(code))
        .map(|(locale, _)| *locale)
}
