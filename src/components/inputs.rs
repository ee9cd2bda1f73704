//! Input helpers: error maps, star ratings, character counters, clipboard,
//! and the clearable registration form.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use super::{data_parse, impl_any, timer::Timeout, Component, ComponentEvent, Dataset, TickContext};

/// Field name to error message. Mounted as `formValidation`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    errors: BTreeMap<String, String>,
}

impl FormErrors {
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// The message for `field`, or an empty string.
    pub fn error(&self, field: &str) -> &str {
        self.errors.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn set_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.insert(field.into(), message.into());
    }

    pub fn clear_error(&mut self, field: &str) {
        self.errors.remove(field);
    }

    pub fn clear_all(&mut self) {
        self.errors.clear();
    }

    pub fn set_errors(&mut self, errors: BTreeMap<String, String>) {
        self.errors = errors;
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Component for FormErrors {
    fn name(&self) -> &'static str {
        "formValidation"
    }

    impl_any!();
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StarRating {
    pub rating: u8,
    pub hover: u8,
}

impl StarRating {
    /// Seeds from `data-rating`, the value of the hidden input.
    pub fn from_dataset(dataset: &Dataset) -> Self {
        Self {
            rating: data_parse(dataset, "rating").unwrap_or(0),
            hover: 0,
        }
    }

    pub fn set_rating(&mut self, value: u8) {
        self.rating = value;
    }

    pub fn set_hover(&mut self, value: u8) {
        self.hover = value;
    }

    pub fn clear_hover(&mut self) {
        self.hover = 0;
    }

    /// Hovering previews; otherwise the committed rating shows.
    pub fn is_active(&self, star: u8) -> bool {
        let shown = if self.hover > 0 { self.hover } else { self.rating };
        star <= shown
    }
}

impl Component for StarRating {
    fn name(&self) -> &'static str {
        "starRating"
    }

    impl_any!();
}

pub const DEFAULT_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharCounter {
    pub count: usize,
    pub max: usize,
}

impl Default for CharCounter {
    fn default() -> Self {
        Self {
            count: 0,
            max: DEFAULT_MAX_CHARS,
        }
    }
}

impl CharCounter {
    /// `data-max-length` mirrors the textarea's `maxlength`; `data-value`
    /// is its initial text.
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let mut counter = Self::default();
        if let Some(max) = data_parse::<usize>(dataset, "max-length").filter(|max| *max > 0) {
            counter.max = max;
            counter.count = dataset
                .get("value")
                .map(|text| text.chars().count())
                .unwrap_or(0);
        }
        counter
    }

    pub fn update(&mut self, value: &str) {
        self.count = value.chars().count();
    }

    pub fn remaining(&self) -> i64 {
        self.max as i64 - self.count as i64
    }

    pub fn is_over_limit(&self) -> bool {
        self.count > self.max
    }

    /// Past 90% of the maximum.
    pub fn is_near_limit(&self) -> bool {
        self.count * 10 > self.max * 9
    }
}

impl Component for CharCounter {
    fn name(&self) -> &'static str {
        "charCounter"
    }

    impl_any!();
}

/// Destination for copied text, the system clipboard in a real host.
pub trait ClipboardSink {
    fn write_text(&mut self, text: &str) -> Result<(), String>;
}

const COPIED_FEEDBACK_MS: i64 = 2_000;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clipboard {
    pub copied: bool,
    pub copy_text: String,
    reset: Timeout,
}

impl Clipboard {
    pub fn new(copy_text: impl Into<String>) -> Self {
        Self {
            copy_text: copy_text.into(),
            ..Self::default()
        }
    }

    /// `data-copy-text`.
    pub fn from_dataset(dataset: &Dataset) -> Self {
        Self::new(dataset.get("copy-text").cloned().unwrap_or_default())
    }

    /// Copies `source` when given, else the configured text. `copied` stays
    /// set for two seconds.
    pub fn copy(
        &mut self,
        source: Option<&str>,
        sink: &mut dyn ClipboardSink,
        now: DateTime<Utc>,
    ) -> bool {
        let text = source.unwrap_or(&self.copy_text).to_string();
        match sink.write_text(&text) {
            Ok(()) => {
                self.copied = true;
                self.reset = Timeout::start(now, Duration::milliseconds(COPIED_FEEDBACK_MS));
                true
            }
            Err(err) => {
                tracing::error!(%err, "failed to copy to clipboard");
                false
            }
        }
    }
}

impl Component for Clipboard {
    fn name(&self) -> &'static str {
        "clipboard"
    }

    fn tick(&mut self, ctx: &TickContext<'_>) -> Vec<ComponentEvent> {
        if self.reset.poll(ctx.now) {
            self.copied = false;
        }
        Vec::new()
    }

    fn destroy(&mut self) {
        self.reset.cancel();
    }

    impl_any!();
}

/// Field values of a plain registration form. Mounted as `registrationForm`
/// with the field names in `data-fields`, comma separated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    values: BTreeMap<String, String>,
}

impl RegistrationForm {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let values: BTreeMap<String, String> = dataset
            .get("fields")
            .map(|fields| {
                fields
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(|name| (name.to_string(), String::new()))
                    .collect()
            })
            .unwrap_or_default();
        Self { values }
    }

    /// Records an input's value; unseen names become fields.
    pub fn set_value(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Blanks every field and announces the reset.
    pub fn clear_form(&mut self) -> Vec<ComponentEvent> {
        self.values.values_mut().for_each(String::clear);
        tracing::debug!(fields = self.values.len(), "registration form cleared");
        vec![ComponentEvent::FormCleared]
    }

    /// Blanks one field. Returns false when the form has no such field.
    pub fn reset_field(&mut self, name: &str) -> bool {
        match self.values.get_mut(name) {
            Some(value) => {
                value.clear();
                true
            }
            None => false,
        }
    }
}

impl Component for RegistrationForm {
    fn name(&self) -> &'static str {
        "registrationForm"
    }

    impl_any!();
}
