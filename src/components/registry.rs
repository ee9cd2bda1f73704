//! Name-keyed factories and the set of mounted component instances.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    alert::Alert,
    assign::AssignModal,
    autosave::AutoSave,
    availability::AvailabilityMatrix,
    countdown::{Countdown, SessionTimer},
    disclosure::{Accordion, ConfirmDialog, Dropdown, Modal, Tabs, Toggle},
    inputs::{CharCounter, Clipboard, FormErrors, RegistrationForm, StarRating},
    polling::Polling,
    session::{SessionManagement, SessionState},
    Component, ComponentEvent, Dataset, TickContext,
};
use crate::{
    config::ClientConfig,
    errors::{ClientError, Result},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentId(Uuid);

impl ComponentId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Factory = Box<dyn Fn(&Dataset, DateTime<Utc>) -> Result<Box<dyn Component>>>;

/// Mounted components in mount order. Unmounting, or dropping the registry,
/// destroys each component so none of its timers outlive it.
#[derive(Default)]
pub struct ComponentRegistry {
    factories: BTreeMap<String, Factory>,
    mounted: Vec<(ComponentId, Box<dyn Component>)>,
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .field(
                "mounted",
                &self
                    .mounted
                    .iter()
                    .map(|(id, component)| (id.to_string(), component.name()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every built-in behaviour, taking timing defaults from
    /// `config`.
    pub fn with_defaults(config: &ClientConfig) -> Self {
        let mut registry = Self::new();
        let poll_ms = config.polling_interval_ms;
        let debounce_ms = config.autosave_debounce_ms;
        let notice_ms = config.notice_timeout_ms;

        registry.register("dropdown", |_, _| Ok(Box::new(Dropdown::new())));
        registry.register("mobileMenu", |_, _| Ok(Box::new(Dropdown::mobile_menu())));
        registry.register("modal", |_, _| Ok(Box::new(Modal::default())));
        registry.register("confirmDialog", |_, _| Ok(Box::new(ConfirmDialog::default())));
        registry.register("formValidation", |_, _| Ok(Box::new(FormErrors::default())));
        registry.register("starRating", |ds, _| Ok(Box::new(StarRating::from_dataset(ds))));
        registry.register("charCounter", |ds, _| Ok(Box::new(CharCounter::from_dataset(ds))));
        registry.register("tabs", |ds, _| Ok(Box::new(Tabs::from_dataset(ds))));
        registry.register("toggle", |ds, _| Ok(Box::new(Toggle::from_dataset(ds))));
        registry.register("accordion", |ds, _| Ok(Box::new(Accordion::from_dataset(ds))));
        registry.register("clipboard", |ds, _| Ok(Box::new(Clipboard::from_dataset(ds))));
        registry.register("registrationForm", |ds, _| {
            Ok(Box::new(RegistrationForm::from_dataset(ds)))
        });
        registry.register("alert", move |_, _| Ok(Box::new(Alert::new(notice_ms))));
        registry.register("autoSave", move |ds, _| {
            Ok(Box::new(AutoSave::from_dataset(ds, debounce_ms)))
        });
        registry.register("sessionTimer", |ds, now| {
            Ok(Box::new(SessionTimer::from_dataset(ds, now)))
        });
        registry.register("countdown", |ds, now| Ok(Box::new(Countdown::from_dataset(ds, now))));
        registry.register("polling", move |ds, now| {
            Ok(Box::new(Polling::from_dataset(ds, poll_ms, now)))
        });
        registry.register("sessionState", |ds, _| Ok(Box::new(SessionState::from_dataset(ds))));
        registry.register("sessionManagement", |ds, now| {
            Ok(Box::new(SessionManagement::from_dataset(ds, now)))
        });
        registry.register("assignModal", |_, _| Ok(Box::new(AssignModal::default())));
        registry.register("availabilityMatrix", |ds, _| {
            Ok(Box::new(AvailabilityMatrix::from_dataset(ds)))
        });
        registry
    }

    /// Adds or replaces the factory for `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&Dataset, DateTime<Utc>) -> Result<Box<dyn Component>> + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn registered_names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn mount(&mut self, name: &str, dataset: &Dataset, now: DateTime<Utc>) -> Result<ComponentId> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ClientError::InvalidInput(format!("unknown component `{}`", name)))?;
        let component = factory(dataset, now)?;
        let id = ComponentId::new();
        tracing::debug!(%id, name, "component mounted");
        self.mounted.push((id, component));
        Ok(id)
    }

    /// Destroys and removes the instance. Returns false for unknown ids.
    pub fn unmount(&mut self, id: ComponentId) -> bool {
        let Some(index) = self.mounted.iter().position(|(mounted, _)| *mounted == id) else {
            return false;
        };
        let (_, mut component) = self.mounted.remove(index);
        component.destroy();
        tracing::debug!(%id, name = component.name(), "component unmounted");
        true
    }

    pub fn len(&self) -> usize {
        self.mounted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounted.is_empty()
    }

    pub fn ids(&self) -> Vec<ComponentId> {
        self.mounted.iter().map(|(id, _)| *id).collect()
    }

    pub fn name_of(&self, id: ComponentId) -> Option<&'static str> {
        self.find(id).map(|component| component.name())
    }

    /// Ticks every instance in mount order and tags events with their source.
    pub fn tick_all(&mut self, ctx: &TickContext<'_>) -> Vec<(ComponentId, ComponentEvent)> {
        let mut events = Vec::new();
        for (id, component) in &mut self.mounted {
            events.extend(component.tick(ctx).into_iter().map(|event| (*id, event)));
        }
        events
    }

    pub fn get<T: Component>(&self, id: ComponentId) -> Option<&T> {
        self.find(id)?.as_any().downcast_ref::<T>()
    }

    pub fn get_mut<T: Component>(&mut self, id: ComponentId) -> Option<&mut T> {
        self.mounted
            .iter_mut()
            .find(|(mounted, _)| *mounted == id)?
            .1
            .as_any_mut()
            .downcast_mut::<T>()
    }

    fn find(&self, id: ComponentId) -> Option<&dyn Component> {
        self.mounted
            .iter()
            .find(|(mounted, _)| *mounted == id)
            .map(|(_, component)| &**component)
    }
}

impl Drop for ComponentRegistry {
    fn drop(&mut self) {
        for (_, component) in &mut self.mounted {
            component.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn every_named_behaviour_is_registered() {
        let registry = ComponentRegistry::with_defaults(&ClientConfig::default());
        for name in [
            "dropdown",
            "mobileMenu",
            "modal",
            "confirmDialog",
            "formValidation",
            "starRating",
            "charCounter",
            "tabs",
            "toggle",
            "accordion",
            "clipboard",
            "alert",
            "autoSave",
            "sessionTimer",
            "countdown",
            "polling",
            "sessionState",
            "sessionManagement",
            "assignModal",
            "availabilityMatrix",
            "registrationForm",
        ] {
            assert!(registry.is_registered(name), "{} missing", name);
        }
    }

    #[test]
    fn unknown_name_is_an_error() {
        let mut registry = ComponentRegistry::with_defaults(&ClientConfig::default());
        let err = registry.mount("carousel", &Dataset::new(), t0()).unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn downcast_reaches_the_concrete_type() {
        let mut registry = ComponentRegistry::with_defaults(&ClientConfig::default());
        let dataset: Dataset = [("initial-tab".to_string(), "2".to_string())].into();
        let id = registry.mount("tabs", &dataset, t0()).unwrap();

        assert_eq!(registry.name_of(id), Some("tabs"));
        assert!(registry.get::<Toggle>(id).is_none());
        registry.get_mut::<Tabs>(id).unwrap().next_tab();
        assert_eq!(registry.get::<Tabs>(id).unwrap().active, 3);
    }

    #[test]
    fn registration_form_mounts_with_its_fields_and_clears() {
        let mut registry = ComponentRegistry::with_defaults(&ClientConfig::default());
        let dataset: Dataset = [("fields".to_string(), "fullName,email".to_string())].into();
        let id = registry.mount("registrationForm", &dataset, t0()).unwrap();

        let form = registry.get_mut::<RegistrationForm>(id).unwrap();
        form.set_value("fullName", "Budi");
        assert_eq!(form.clear_form(), vec![ComponentEvent::FormCleared]);
        assert_eq!(form.value("fullName"), Some(""));
    }

    #[test]
    fn unmount_is_idempotent() {
        let mut registry = ComponentRegistry::with_defaults(&ClientConfig::default());
        let id = registry.mount("modal", &Dataset::new(), t0()).unwrap();
        assert!(registry.unmount(id));
        assert!(!registry.unmount(id));
        assert!(registry.get::<Modal>(id).is_none());
    }
}
