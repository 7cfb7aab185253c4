//! Per-field length and pattern rules shared by the forms.

use std::fmt;

use regex::Regex;

use crate::config::{FormOverrides, RuleOverride};
use crate::error::{Error, Result};

const NAME_PATTERN: &str = r"^[a-zA-Z0-9À-ÖØ-öø-įĴ-őŔ-žǍ-ǰǴ-ǵǸ-țȞ-ȟȤ-ȳɃɆ-ɏḀ-ẞƀ-ƓƗ-ƚƝ-ơƤ-ƥƫ-ưƲ-ƶẠ-ỿ '#,.&()-]+$";
const NAME_MESSAGE: &str =
    "Must only contain alphanumeric characters, numbers, spaces, or '#,.&()[]-]+$";
const COUNTRY_PATTERN: &str = r"^[a-zA-ZÀ-ÖØ-öø-įĴ-őŔ-žǍ-ǰǴ-ǵǸ-țȞ-ȟȤ-ȳɃɆ-ɏḀ-ẞƀ-ƓƗ-ƚƝ-ơƤ-ƥƫ-ưƲ-ƶẠ-ỿ '-]+$";
const COUNTRY_MESSAGE: &str = "Must be alphanumeric (spaces, -, ' optional)";
const DEFAULT_LENGTH_MESSAGE: &str = "{name} must be between {min} and {max} characters long.";

pub const PASSWORD_MIN_LENGTH: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// One field's constraints. Lengths are inclusive and counted in chars.
#[derive(Debug, Clone)]
pub struct FieldRule {
    field: String,
    label: String,
    min_length: usize,
    max_length: usize,
    pattern: Option<Regex>,
    regex_message: String,
    // `{name}`, `{min}` and `{max}` are interpolated.
    length_message: String,
}

impl FieldRule {
    pub fn new(field: &str, label: &str, min_length: usize, max_length: usize) -> Self {
        Self {
            field: field.to_string(),
            label: label.to_string(),
            min_length,
            max_length,
            pattern: None,
            regex_message: String::new(),
            length_message: DEFAULT_LENGTH_MESSAGE.to_string(),
        }
    }

    pub fn with_length_message(mut self, template: &str) -> Self {
        self.length_message = template.to_string();
        self
    }

    pub fn with_pattern(mut self, pattern: &str, message: &str) -> Result<Self> {
        self.pattern = Some(Regex::new(pattern)?);
        self.regex_message = message.to_string();
        Ok(self)
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn length_message(&self) -> String {
        self.length_message
            .replace("{name}", &self.label)
            .replace("{min}", &self.min_length.to_string())
            .replace("{max}", &self.max_length.to_string())
    }

    fn fail(&self, message: String) -> ValidationError {
        ValidationError {
            field: self.field.clone(),
            message,
        }
    }

    /// Length first, then the pattern. The pattern is only consulted for
    /// non-empty values so optional fields may stay blank.
    pub fn check(&self, value: &str) -> std::result::Result<(), ValidationError> {
        let len = value.chars().count();
        if len < self.min_length || len > self.max_length {
            return Err(self.fail(self.length_message()));
        }
        if let Some(pattern) = &self.pattern {
            if !value.is_empty() && !pattern.is_match(value) {
                return Err(self.fail(self.regex_message.clone()));
            }
        }
        Ok(())
    }

    pub fn apply_override(&mut self, over: &RuleOverride) -> Result<()> {
        if let Some(min) = over.min_length {
            self.min_length = min;
        }
        if let Some(max) = over.max_length {
            self.max_length = max;
        }
        if self.min_length > self.max_length {
            return Err(Error::msg(format!(
                "validation override for '{}' has min_length {} above max_length {}",
                self.field, self.min_length, self.max_length
            )));
        }
        if let Some(pattern) = over.regex.as_deref() {
            self.pattern = Some(Regex::new(pattern)?);
        }
        if let Some(message) = &over.regex_message {
            self.regex_message = message.clone();
        }
        if let Some(message) = &over.length_message {
            self.length_message = message.clone();
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RuleSet {
    form: String,
    rules: Vec<FieldRule>,
}

impl RuleSet {
    pub fn new(form: &str, rules: Vec<FieldRule>) -> Self {
        Self {
            form: form.to_string(),
            rules,
        }
    }

    pub fn form(&self) -> &str {
        &self.form
    }

    pub fn get(&self, field: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|r| r.field == field)
    }

    /// Fields without a rule always pass.
    pub fn check(&self, field: &str, value: &str) -> std::result::Result<(), ValidationError> {
        match self.get(field) {
            Some(rule) => rule.check(value),
            None => Ok(()),
        }
    }

    pub fn apply_overrides(&mut self, overrides: &FormOverrides) -> Result<()> {
        for (field, over) in overrides {
            let rule = self
                .rules
                .iter_mut()
                .find(|r| &r.field == field)
                .ok_or_else(|| {
                    Error::msg(format!(
                        "unknown field '{field}' in [validation.{}]",
                        self.form
                    ))
                })?;
            rule.apply_override(over)?;
        }
        Ok(())
    }

    pub fn with_overrides(mut self, overrides: Option<&FormOverrides>) -> Result<Self> {
        if let Some(overrides) = overrides {
            self.apply_overrides(overrides)?;
        }
        Ok(self)
    }
}

pub mod card {
    use super::*;

    pub const FORM: &str = "card";
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const KEYWORDS: &str = "keywords";

    pub fn rules() -> RuleSet {
        RuleSet::new(
            FORM,
            vec![
                FieldRule::new(TITLE, "Title", 1, 50)
                    .with_length_message("The title must be between {min} and {max} in length."),
                FieldRule::new(DESCRIPTION, "Description", 0, 300).with_length_message(
                    "The description length must be between {min} and {max} in length.",
                ),
                // Applied to each keyword without its prefix.
                FieldRule::new(KEYWORDS, "Keywords", 2, 20).with_length_message(
                    "All keywords need to be between {min} and {max} in length.",
                ),
            ],
        )
    }
}

pub mod business {
    use super::*;

    pub const FORM: &str = "business";
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const ADDRESS: &str = "address";
    pub const STREET_NUMBER: &str = "street_number";
    pub const STREET_NAME: &str = "street_name";
    pub const SUBURB: &str = "suburb";
    pub const CITY: &str = "city";
    pub const POSTCODE: &str = "postcode";
    pub const REGION: &str = "region";
    pub const COUNTRY: &str = "country";

    pub fn rules() -> Result<RuleSet> {
        Ok(RuleSet::new(
            FORM,
            vec![
                FieldRule::new(NAME, "Name", 1, 100).with_pattern(NAME_PATTERN, NAME_MESSAGE)?,
                FieldRule::new(DESCRIPTION, "Description", 0, 600),
                FieldRule::new(ADDRESS, "Business address", 0, 255)
                    .with_pattern(NAME_PATTERN, NAME_MESSAGE)?,
                FieldRule::new(STREET_NUMBER, "Street number", 0, 255),
                FieldRule::new(STREET_NAME, "Street name", 0, 255),
                FieldRule::new(SUBURB, "Suburb", 0, 255),
                FieldRule::new(CITY, "City", 0, 255),
                FieldRule::new(POSTCODE, "Postcode", 0, 255),
                FieldRule::new(REGION, "Region", 0, 255),
                FieldRule::new(COUNTRY, "Country", 1, 255)
                    .with_pattern(COUNTRY_PATTERN, COUNTRY_MESSAGE)?,
            ],
        ))
    }
}

/// Live checklist shown next to a new password.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PasswordCriteria {
    pub lower_case: bool,
    pub upper_case: bool,
    pub number: bool,
    pub symbol: bool,
    pub length: bool,
}

impl PasswordCriteria {
    pub fn evaluate(password: &str) -> Self {
        Self {
            lower_case: password.chars().any(char::is_lowercase),
            upper_case: password.chars().any(char::is_uppercase),
            number: password.chars().any(|c| c.is_ascii_digit()),
            symbol: password
                .chars()
                .any(|c| !c.is_alphanumeric() && !c.is_whitespace()),
            length: password.chars().count() >= PASSWORD_MIN_LENGTH,
        }
    }

    pub fn all_met(&self) -> bool {
        self.lower_case && self.upper_case && self.number && self.symbol && self.length
    }
}
