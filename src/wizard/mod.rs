//! Multi-step registration wizard with local draft persistence.
//!
//! [`RegistrationWizard`] ties together the step navigator, the session
//! preference list, the per-step validator and the draft store. The host page
//! forwards input events to it, renders [`WizardView`] projections and drains
//! [`WizardEffect`]s for the things only the page can do (scrolling, alerts,
//! confirmation prompts).

pub mod draft;
pub mod form;
pub mod navigator;
pub mod preferences;
pub mod validator;

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    clock::Clock,
    components::store::Subscribers,
    config::ClientConfig,
    errors::Result,
    storage::KeyValueStore,
};

pub use draft::{DraftStore, FormSnapshot};
pub use form::{registration_form, Field, FieldKind, FormModel};
pub use navigator::{StepIndicator, StepNavigator, StepSection};
pub use preferences::{AddOutcome, PreferenceList, SessionPreferenceEntry, Weekday};
pub use validator::{validate_step, ValidationResult};

const SAVED_MESSAGE: &str = "Progress saved. You can continue filling in the form later.";
const CLEARED_MESSAGE: &str = "Form cleared. You can start again from the beginning.";
const CLEAR_PROMPT: &str = "Are you sure you want to clear all entered data?\n\n\
This will:\n\
- Remove all form data\n\
- Remove the saved progress\n\
- Return to the first step\n\n\
This action cannot be undone.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Saved,
    Cleared,
}

/// Side effects the host page performs on the wizard's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardEffect {
    ScrollToTop,
    Alert(String),
    Notice(NoticeKind, String),
    ConfirmClear(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Delete,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
    /// True when focus sits in an input, textarea or select.
    pub in_form_control: bool,
}

impl KeyPress {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            shift: false,
            in_form_control: false,
        }
    }

    pub fn ctrl(key: Key) -> Self {
        Self {
            ctrl: true,
            ..Self::plain(key)
        }
    }
}

/// Render projection of the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardView {
    pub current_step: usize,
    pub total_steps: usize,
    pub sections: Vec<StepSection>,
    pub indicators: Vec<StepIndicator>,
    pub submit_visible: bool,
    pub can_add_preference: bool,
    pub preference_count: usize,
    pub tahsin_details_visible: bool,
    pub submitting: bool,
    pub invalid_fields: BTreeSet<String>,
}

pub struct RegistrationWizard<S> {
    form: FormModel,
    preferences: PreferenceList,
    navigator: StepNavigator,
    drafts: DraftStore<S>,
    clock: Box<dyn Clock>,
    effects: Vec<WizardEffect>,
    observers: Subscribers<WizardView>,
    invalid_fields: BTreeSet<String>,
    tahsin_details_visible: bool,
    submitting: bool,
}

impl<S: KeyValueStore> RegistrationWizard<S> {
    pub fn new(form: FormModel, store: S, clock: Box<dyn Clock>, config: &ClientConfig) -> Self {
        Self {
            form,
            preferences: PreferenceList::new(config.max_session_preferences),
            navigator: StepNavigator::new(config.total_steps),
            drafts: DraftStore::new(store, config.draft_storage_key.clone()),
            clock,
            effects: Vec::new(),
            observers: Subscribers::new(),
            invalid_fields: BTreeSet::new(),
            tahsin_details_visible: false,
            submitting: false,
        }
    }

    /// Wizard over the standard student registration form.
    pub fn registration(store: S, clock: Box<dyn Clock>, config: &ClientConfig) -> Self {
        Self::new(registration_form(), store, clock, config)
    }

    pub fn form(&self) -> &FormModel {
        &self.form
    }

    pub fn preferences(&self) -> &PreferenceList {
        &self.preferences
    }

    pub fn drafts(&self) -> &DraftStore<S> {
        &self.drafts
    }

    pub fn current_step(&self) -> usize {
        self.navigator.current_step()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn subscribe(&mut self, render: impl FnMut(&WizardView) + 'static) {
        self.observers.subscribe(render);
    }

    pub fn take_effects(&mut self) -> Vec<WizardEffect> {
        std::mem::take(&mut self.effects)
    }

    pub fn view(&self) -> WizardView {
        WizardView {
            current_step: self.navigator.current_step(),
            total_steps: self.navigator.total_steps(),
            sections: self.navigator.sections(),
            indicators: self.navigator.indicators(),
            submit_visible: self.navigator.submit_visible(),
            can_add_preference: self.preferences.can_add(),
            preference_count: self.preferences.len(),
            tahsin_details_visible: self.tahsin_details_visible,
            submitting: self.submitting,
            invalid_fields: self.invalid_fields.clone(),
        }
    }

    /// Shows `step`, persists a draft and asks the page to scroll up.
    pub fn go_to_step(&mut self, step: usize) -> bool {
        if !self.navigator.go_to(step) {
            return false;
        }
        self.persist();
        self.effects.push(WizardEffect::ScrollToTop);
        self.notify();
        true
    }

    /// Next button / right arrow: the current step must validate first.
    pub fn advance(&mut self) -> bool {
        if self.navigator.is_last() {
            return false;
        }
        if !self.validate_current().is_valid {
            self.notify();
            return false;
        }
        self.go_to_step(self.navigator.current_step() + 1)
    }

    /// Back button / left arrow. Never validates.
    pub fn previous(&mut self) -> bool {
        if self.navigator.is_first() {
            return false;
        }
        self.go_to_step(self.navigator.current_step() - 1)
    }

    /// Step indicator click. Visited steps are always reachable; later steps
    /// require the current one to pass.
    pub fn select_step(&mut self, step: usize) -> bool {
        if !self.navigator.contains(step) {
            return false;
        }
        if step > self.navigator.current_step() && !self.validate_current().is_valid {
            self.notify();
            return false;
        }
        self.go_to_step(step)
    }

    /// Validates the visible step, queueing an alert when it fails.
    pub fn validate_current(&mut self) -> ValidationResult {
        let step = self.navigator.current_step();
        let result = validate_step(step, &mut self.form, &self.preferences);
        self.invalid_fields = result.invalid_fields.clone();
        if let Some(message) = result.message() {
            self.effects.push(WizardEffect::Alert(message));
        }
        result
    }

    /// Assigns a value by field name, including preference fields.
    pub fn set_value(&mut self, name: &str, value: &str) -> bool {
        let changed = if preferences::parse_field_name(name).is_some() {
            self.preferences.apply_field(name, value)
        } else {
            self.form.set_value(name, value)
        };
        if changed {
            self.after_edit(name);
            self.notify();
        }
        changed
    }

    /// Checks or unchecks one option; preference day boxes included.
    pub fn check(&mut self, name: &str, option: &str, checked: bool) -> bool {
        let changed = match preferences::parse_field_name(name) {
            Some((index, preferences::DAYS_FIELD)) => match option.parse::<Weekday>() {
                Ok(day) => self.preferences.toggle_day(index, day, checked),
                Err(_) => false,
            },
            Some(_) => false,
            None => self.form.check(name, option, checked),
        };
        if changed {
            self.after_edit(name);
            self.notify();
        }
        changed
    }

    pub fn add_preference(&mut self) -> AddOutcome {
        let outcome = self.preferences.add();
        if let AddOutcome::LimitReached(message) = &outcome {
            self.effects.push(WizardEffect::Alert(message.clone()));
        }
        self.notify();
        outcome
    }

    pub fn remove_preference(&mut self, index: usize) -> bool {
        let removed = self.preferences.remove(index);
        if removed {
            self.notify();
        }
        removed
    }

    /// Current field values, preference entries included.
    pub fn form_data(&self) -> BTreeMap<String, String> {
        let mut data = self.form.values();
        data.extend(self.preferences.form_entries());
        data
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            current_step: self.navigator.current_step(),
            form_data: self.form_data(),
            timestamp: self.clock.now(),
        }
    }

    /// Manual save (button or Ctrl+S).
    pub fn save_progress(&mut self) -> Result<()> {
        self.drafts.save(&self.snapshot())?;
        self.effects
            .push(WizardEffect::Notice(NoticeKind::Saved, SAVED_MESSAGE.into()));
        Ok(())
    }

    /// Restores a stored draft, if any. Returns whether one was applied.
    pub fn load_draft(&mut self) -> bool {
        let Some(snapshot) = self.drafts.load() else {
            return false;
        };
        for (name, value) in &snapshot.form_data {
            let applied = if preferences::parse_field_name(name).is_some() {
                self.preferences.restore_field(name, value)
            } else {
                self.form.restore(name, value)
            };
            if !applied {
                tracing::debug!(field = %name, "draft field has no matching input");
            }
        }
        self.sync_tahsin_details(false);
        if !self.navigator.go_to(snapshot.current_step) {
            tracing::debug!(step = snapshot.current_step, "draft step out of range");
        }
        tracing::debug!(step = self.navigator.current_step(), "draft restored");
        self.notify();
        true
    }

    /// Queues the confirmation prompt shown before [`clear`](Self::clear).
    pub fn request_clear(&mut self) {
        self.effects
            .push(WizardEffect::ConfirmClear(CLEAR_PROMPT.to_string()));
    }

    /// Drops the draft and every entered value, back to step 1.
    pub fn clear(&mut self) -> Result<()> {
        self.drafts.clear()?;
        self.form.reset();
        self.preferences.clear_all();
        self.navigator.reset();
        self.invalid_fields.clear();
        self.tahsin_details_visible = false;
        self.submitting = false;
        self.effects.push(WizardEffect::ScrollToTop);
        self.effects.push(WizardEffect::Notice(
            NoticeKind::Cleared,
            CLEARED_MESSAGE.into(),
        ));
        self.notify();
        Ok(())
    }

    /// Validates every step and, when all pass, returns the payload to post.
    ///
    /// The first failing step becomes visible. On success the draft is
    /// removed and the wizard enters its submitting state.
    pub fn submit(&mut self) -> std::result::Result<BTreeMap<String, String>, ValidationResult> {
        for step in 1..=self.navigator.total_steps() {
            let result = validate_step(step, &mut self.form, &self.preferences);
            if !result.is_valid {
                self.invalid_fields = result.invalid_fields.clone();
                if step != self.navigator.current_step() {
                    self.navigator.go_to(step);
                    self.effects.push(WizardEffect::ScrollToTop);
                }
                if let Some(message) = result.message() {
                    self.effects.push(WizardEffect::Alert(message));
                }
                self.notify();
                return Err(result);
            }
        }
        self.invalid_fields.clear();
        self.submitting = true;
        if let Err(err) = self.drafts.clear() {
            tracing::warn!(%err, "could not remove draft after submit");
        }
        tracing::info!("registration submitted");
        self.notify();
        Ok(self.form_data())
    }

    /// Keyboard shortcuts. Returns true when the key was consumed.
    pub fn handle_key(&mut self, press: KeyPress) -> bool {
        match press.key {
            Key::Char('s') | Key::Char('S') if press.ctrl && !press.shift => {
                if let Err(err) = self.save_progress() {
                    tracing::warn!(%err, "manual save failed");
                }
                true
            }
            Key::Delete if press.ctrl && press.shift => {
                self.request_clear();
                true
            }
            Key::ArrowLeft if !press.in_form_control && !self.navigator.is_first() => {
                self.previous()
            }
            Key::ArrowRight if !press.in_form_control && !self.navigator.is_last() => {
                self.advance();
                true
            }
            _ => false,
        }
    }

    fn persist(&self) {
        if let Err(err) = self.drafts.save(&self.snapshot()) {
            tracing::warn!(%err, "draft save failed");
        }
    }

    fn after_edit(&mut self, name: &str) {
        if name == form::TAHSIN_EXPERIENCE_FIELD {
            self.sync_tahsin_details(true);
        }
    }

    /// Details are shown only for "true". Answering anything else also clears
    /// them; restoring a draft never does.
    fn sync_tahsin_details(&mut self, clear_hidden: bool) {
        let experienced = self.form.value_of(form::TAHSIN_EXPERIENCE_FIELD) == Some("true");
        self.tahsin_details_visible = experienced;
        if clear_hidden && !experienced && self.form.has_field(form::TAHSIN_DETAILS_FIELD) {
            self.form.set_value(form::TAHSIN_DETAILS_FIELD, "");
        }
    }

    fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let view = self.view();
        self.observers.notify(&view);
    }
}
