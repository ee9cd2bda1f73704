//! Field model backing the registration wizard.
//!
//! The model is the single source of truth for every input on the page; the
//! host renders it and feeds edits back through [`FormModel::set_value`] and
//! [`FormModel::check`]. Checkable inputs (radios and checkboxes) that share a
//! name are separate fields distinguished by their option value.

use std::collections::BTreeMap;

/// Supported input kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Tel,
    Date,
    TextArea,
    Select,
    Url,
    Checkbox,
    Radio,
}

impl FieldKind {
    pub fn is_checkable(self) -> bool {
        matches!(self, FieldKind::Checkbox | FieldKind::Radio)
    }
}

/// A single input element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub id: String,
    pub kind: FieldKind,
    pub step: usize,
    pub required: bool,
    pub min_length: Option<usize>,
    /// Current text for text-like inputs, option value for checkables.
    pub value: String,
    pub checked: bool,
    pub invalid: bool,
}

impl Field {
    /// Creates a required text-like field whose id equals its name.
    pub fn new(name: &str, kind: FieldKind, step: usize) -> Self {
        Self {
            name: name.to_string(),
            id: name.to_string(),
            kind,
            step,
            required: true,
            min_length: None,
            value: String::new(),
            checked: false,
            invalid: false,
        }
    }

    /// Creates one member of a radio group or checkbox set.
    pub fn option(name: &str, option: &str, kind: FieldKind, step: usize) -> Self {
        Self {
            id: format!("{}_{}", name, option),
            value: option.to_string(),
            ..Self::new(name, kind, step)
        }
    }

    pub fn with_optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    /// Whether the field holds something a required marker accepts.
    pub fn is_filled(&self) -> bool {
        if self.kind.is_checkable() {
            self.checked
        } else {
            !self.value.trim().is_empty()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormModel {
    fields: Vec<Field>,
}

impl FormModel {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.id == id)
    }

    pub fn fields_for_step(&self, step: usize) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(move |field| field.step == step)
    }

    pub(crate) fn fields_mut(&mut self) -> &mut [Field] {
        &mut self.fields
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|field| field.name == name)
    }

    /// Assigns a text value, or selects the matching option of a radio group.
    pub fn set_value(&mut self, name: &str, value: &str) -> bool {
        let Some(kind) = self.kind_of(name) else {
            return false;
        };
        match kind {
            FieldKind::Radio => self.check(name, value, true),
            FieldKind::Checkbox => self.check(name, value, true),
            _ => {
                let mut found = false;
                for field in self.fields.iter_mut().filter(|f| f.name == name) {
                    field.value = value.to_string();
                    found = true;
                }
                found
            }
        }
    }

    /// Checks or unchecks one option. Checking a radio unchecks its siblings.
    pub fn check(&mut self, name: &str, option: &str, checked: bool) -> bool {
        let exists = self
            .fields
            .iter()
            .any(|f| f.name == name && f.kind.is_checkable() && f.value == option);
        if !exists {
            return false;
        }
        for field in self.fields.iter_mut().filter(|f| f.name == name) {
            if field.value == option {
                field.checked = checked;
            } else if field.kind == FieldKind::Radio && checked {
                field.checked = false;
            }
        }
        true
    }

    /// Current value by name; for checkables, the last checked option.
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .filter(|field| field.name == name)
            .filter(|field| !field.kind.is_checkable() || field.checked)
            .map(|field| field.value.as_str())
            .last()
    }

    /// Name/value map with form-submission semantics: unchecked options are
    /// skipped and the last value per name wins.
    pub fn values(&self) -> BTreeMap<String, String> {
        let mut values = BTreeMap::new();
        for field in &self.fields {
            if field.kind.is_checkable() && !field.checked {
                continue;
            }
            values.insert(field.name.clone(), field.value.clone());
        }
        values
    }

    /// Repopulates a field from a stored draft value.
    pub fn restore(&mut self, name: &str, value: &str) -> bool {
        let mut found = false;
        for field in self.fields.iter_mut().filter(|f| f.name == name) {
            if field.kind.is_checkable() {
                field.checked = field.value == value;
            } else {
                field.value = value.to_string();
            }
            found = true;
        }
        found
    }

    pub fn reset(&mut self) {
        for field in &mut self.fields {
            if field.kind.is_checkable() {
                field.checked = false;
            } else {
                field.value.clear();
            }
            field.invalid = false;
        }
    }

    pub fn clear_marks(&mut self, step: usize) {
        for field in self.fields.iter_mut().filter(|f| f.step == step) {
            field.invalid = false;
        }
    }

    pub fn invalid_ids(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|field| field.invalid)
            .map(|field| field.id.as_str())
            .collect()
    }

    fn kind_of(&self, name: &str) -> Option<FieldKind> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.kind)
    }
}

pub const TAHSIN_EXPERIENCE_FIELD: &str = "previousTahsinExperience";
pub const TAHSIN_DETAILS_FIELD: &str = "previousTahsinDetails";

/// The standard five-step student registration form. Step 4 holds only the
/// session preference list, which lives outside this model.
pub fn registration_form() -> FormModel {
    use FieldKind::*;

    FormModel::new(vec![
        Field::new("fullName", Text, 1),
        Field::option("gender", "MALE", Radio, 1),
        Field::option("gender", "FEMALE", Radio, 1),
        Field::new("dateOfBirth", Date, 1),
        Field::new("placeOfBirth", Text, 1),
        Field::new("phoneNumber", Tel, 1),
        Field::new("email", Email, 1),
        Field::new("address", TextArea, 1),
        Field::new("emergencyContactName", Text, 1),
        Field::new("emergencyContactPhone", Tel, 1),
        Field::new("emergencyContactRelation", Text, 1),
        Field::new("educationLevel", Select, 2),
        Field::new("schoolName", Text, 2).with_optional(),
        Field::new("quranReadingExperience", Select, 2),
        Field::option(TAHSIN_EXPERIENCE_FIELD, "true", Radio, 2).with_optional(),
        Field::option(TAHSIN_EXPERIENCE_FIELD, "false", Radio, 2).with_optional(),
        Field::new(TAHSIN_DETAILS_FIELD, TextArea, 2).with_optional(),
        Field::new("programId", Select, 3),
        Field::new("registrationReason", TextArea, 3).with_optional(),
        Field::new("learningGoals", TextArea, 3).with_optional(),
        Field::new("recordingDriveLink", Url, 5),
    ])
}
