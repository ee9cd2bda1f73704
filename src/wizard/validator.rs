use std::{collections::BTreeSet, fmt};

use once_cell::sync::Lazy;
use regex::Regex;

use super::{
    form::{Field, FieldKind, FormModel},
    preferences::{field_id, PreferenceList, SESSION_FIELD},
};

pub const SCHEDULE_STEP: usize = 4;
pub const INCOMPLETE_STEP_MESSAGE: &str =
    "Please complete all required fields before continuing to the next step";
pub const MISSING_SESSION_MESSAGE: &str = "Select at least one session preference";

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

/// Field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Built-in checks applied to a trimmed input value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    NonEmpty,
    Email,
    MinLength(usize),
}

impl Rule {
    pub fn check(&self, input: &str) -> Result<(), ValidationError> {
        let trimmed = input.trim();
        match self {
            Rule::NonEmpty => {
                if trimmed.is_empty() {
                    Err(ValidationError::new("Value cannot be empty"))
                } else {
                    Ok(())
                }
            }
            Rule::Email => {
                if trimmed.is_empty() || EMAIL_PATTERN.is_match(trimmed) {
                    Ok(())
                } else {
                    Err(ValidationError::new("Enter a valid email address"))
                }
            }
            Rule::MinLength(min) => {
                if trimmed.is_empty() || trimmed.chars().count() >= *min {
                    Ok(())
                } else {
                    Err(ValidationError::new(format!(
                        "Enter at least {} characters",
                        min
                    )))
                }
            }
        }
    }
}

pub fn is_valid_email(input: &str) -> bool {
    EMAIL_PATTERN.is_match(input.trim())
}

/// Outcome of validating one step. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub invalid_fields: BTreeSet<String>,
    pub messages: Vec<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            ..Self::default()
        }
    }

    /// One aggregate message for the user, if anything failed.
    pub fn message(&self) -> Option<String> {
        if self.messages.is_empty() {
            None
        } else {
            Some(self.messages.join("\n"))
        }
    }
}

fn text_rules(field: &Field) -> Vec<Rule> {
    let mut rules = Vec::new();
    if field.required {
        rules.push(Rule::NonEmpty);
    }
    if field.kind == FieldKind::Email {
        rules.push(Rule::Email);
    }
    if let Some(min) = field.min_length {
        rules.push(Rule::MinLength(min));
    }
    rules
}

/// Validates every field on `step`, marking offenders on the form.
///
/// Prior marks on the step are cleared first, so a passing step leaves no
/// highlighting behind.
pub fn validate_step(
    step: usize,
    form: &mut FormModel,
    preferences: &PreferenceList,
) -> ValidationResult {
    form.clear_marks(step);

    let mut failed_groups: BTreeSet<String> = BTreeSet::new();
    for field in form.fields().iter().filter(|f| f.step == step) {
        if field.kind.is_checkable() && field.required && !group_filled(form, &field.name) {
            failed_groups.insert(field.name.clone());
        }
    }

    let mut invalid = BTreeSet::new();
    for field in form.fields_mut().iter_mut().filter(|f| f.step == step) {
        let failed = if field.kind.is_checkable() {
            failed_groups.contains(&field.name)
        } else {
            text_rules(field)
                .iter()
                .any(|rule| rule.check(&field.value).is_err())
        };
        if failed {
            field.invalid = true;
            invalid.insert(field.id.clone());
        }
    }

    let mut messages = Vec::new();
    if !invalid.is_empty() {
        messages.push(INCOMPLETE_STEP_MESSAGE.to_string());
    }

    if step == SCHEDULE_STEP && !preferences.has_selected_session() {
        for entry in preferences.entries() {
            invalid.insert(field_id(entry.index, SESSION_FIELD));
        }
        messages.push(MISSING_SESSION_MESSAGE.to_string());
    }

    let result = ValidationResult {
        is_valid: messages.is_empty(),
        invalid_fields: invalid,
        messages,
    };
    if !result.is_valid {
        tracing::debug!(step, invalid = ?result.invalid_fields, "step validation failed");
    }
    result
}

fn group_filled(form: &FormModel, name: &str) -> bool {
    form.fields()
        .iter()
        .any(|field| field.name == name && field.checked)
}
