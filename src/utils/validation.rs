use std::sync::LazyLock;

use regex::Regex;
use validator::{Validate, ValidateEmail};

use crate::error::{Error, FieldError};

/// Turns collected field errors into a rejection.
pub fn reject_if_any(errors: Vec<FieldError>) -> Result<(), Error> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::Rejected(errors))
    }
}

static RE_EMBEDDED_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([^@\s]+)@((?:[-a-z0-9]+\.)+[a-z]{2,})").expect("embedded email pattern")
});

pub fn validate<T: Validate>(val: &T) -> Result<(), validator::ValidationErrors> {
    val.validate()
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub fn is_valid_email(value: &str) -> bool {
    value.validate_email()
}

pub fn contains_email(text: &str) -> bool {
    RE_EMBEDDED_EMAIL.is_match(text)
}

/// Collects field errors in the order the checks run.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn require(&mut self, field: &'static str, value: Option<&str>, message: &str) {
        if value.map_or(true, is_blank) {
            self.add(field, message);
        }
    }

    pub fn into_vec(self) -> Vec<FieldError> {
        self.errors
    }
}
