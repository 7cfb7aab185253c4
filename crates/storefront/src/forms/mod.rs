//! Form state: one value and one error per field, recomputed on every
//! submit attempt.

pub mod business;
pub mod card;
pub mod password;

use crate::validation::ValidationError;

/// Class a field's input gets while its value is rejected.
pub const INVALID_CLASS: &str = "is-invalid";
pub const REQUIRED: &str = "This field is required.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldError {
    message: Option<String>,
}

impl FieldError {
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }

    pub fn class(&self) -> &'static str {
        if self.message.is_some() {
            INVALID_CLASS
        } else {
            ""
        }
    }

    pub fn is_set(&self) -> bool {
        self.message.is_some()
    }

    pub fn set(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn clear(&mut self) {
        self.message = None;
    }

    /// Record a check result; true when it passed.
    pub fn record(&mut self, result: Result<(), ValidationError>) -> bool {
        match result {
            Ok(()) => {
                self.clear();
                true
            }
            Err(err) => {
                self.set(err.message);
                false
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldState {
    pub value: String,
    pub error: FieldError,
}

impl FieldState {
    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn error_message(&self) -> &str {
        self.error.message()
    }

    pub fn error_class(&self) -> &'static str {
        self.error.class()
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.error.clear();
    }
}
