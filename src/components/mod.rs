//! Named page behaviours mounted on a `data-*` dataset and driven by ticks.
//!
//! Each component owns its state and its timers. The host renders from the
//! component's fields and routes the [`ComponentEvent`]s returned by
//! [`Component::tick`] and by action handlers.

pub mod alert;
pub mod assign;
pub mod autosave;
pub mod availability;
pub mod countdown;
pub mod disclosure;
pub mod inputs;
pub mod polling;
pub mod registry;
pub mod session;
pub mod store;
pub mod timer;

use std::{any::Any, collections::BTreeMap, str::FromStr};

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::transport::{Transport, TransportError};

pub use alert::{Alert, AlertKind};
pub use assign::AssignModal;
pub use autosave::{AutoSave, SaveStatus};
pub use availability::{AvailabilityMatrix, SubmissionCheck};
pub use countdown::{format_hms, Countdown, CountdownState, SessionTimer};
pub use disclosure::{Accordion, ConfirmDialog, Dropdown, Modal, Tabs, Toggle};
pub use inputs::{
    CharCounter, Clipboard, ClipboardSink, FormErrors, RegistrationForm, StarRating,
};
pub use polling::{PollStatus, PollTicket, Polling};
pub use registry::{ComponentId, ComponentRegistry};
pub use session::{LatenessRule, SessionControl, SessionManagement, SessionState};
pub use store::Subscribers;
pub use timer::{Interval, Timeout};

/// The `data-*` attributes of the element a component is mounted on, keyed
/// without the `data-` prefix (`poll-url`, `initial-tab`, ...).
pub type Dataset = BTreeMap<String, String>;

/// Outputs a component hands back to its host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentEvent {
    ShowAlert { message: String, kind: AlertKind },
    CountdownExpired,
    /// Re-run the registration search so the table reflects a change.
    RefreshSearch,
    /// Hard navigation, e.g. to the login route after a 401/403.
    Redirect(String),
    /// A poll is due but no transport was available to run it.
    PollRequested { url: String, ticket: PollTicket },
    FormCleared,
}

impl ComponentEvent {
    pub fn alert(message: impl Into<String>, kind: AlertKind) -> Self {
        ComponentEvent::ShowAlert {
            message: message.into(),
            kind,
        }
    }
}

/// What a tick can see: the current instant and, when online, the transport.
#[derive(Clone, Copy)]
pub struct TickContext<'a> {
    pub now: DateTime<Utc>,
    pub transport: Option<&'a Transport>,
}

impl<'a> TickContext<'a> {
    pub fn offline(now: DateTime<Utc>) -> Self {
        Self {
            now,
            transport: None,
        }
    }

    pub fn online(now: DateTime<Utc>, transport: &'a Transport) -> Self {
        Self {
            now,
            transport: Some(transport),
        }
    }
}

pub trait Component: Any {
    fn name(&self) -> &'static str;

    fn tick(&mut self, _ctx: &TickContext<'_>) -> Vec<ComponentEvent> {
        Vec::new()
    }

    /// Cancels every timer the component owns. Called on unmount.
    fn destroy(&mut self) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

macro_rules! impl_any {
    () => {
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    };
}
pub(crate) use impl_any;

pub(crate) fn data_flag(dataset: &Dataset, key: &str) -> bool {
    dataset.get(key).is_some_and(|value| value == "true")
}

pub(crate) fn data_parse<T: FromStr>(dataset: &Dataset, key: &str) -> Option<T> {
    dataset.get(key).and_then(|value| value.trim().parse().ok())
}

/// Accepts RFC 3339 or a zone-less `YYYY-MM-DDTHH:MM:SS`, read as UTC.
pub(crate) fn data_instant(dataset: &Dataset, key: &str) -> Option<DateTime<Utc>> {
    let raw = dataset.get(key)?.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

/// Events every caller emits for a failed server call besides its own
/// handling: authentication failures become a redirect.
pub(crate) fn redirect_on_auth(err: &TransportError) -> Option<ComponentEvent> {
    err.redirect()
        .map(|route| ComponentEvent::Redirect(route.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dataset(pairs: &[(&str, &str)]) -> Dataset {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn instants_parse_with_or_without_zone() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let zoned = dataset(&[("start-time", "2024-01-01T10:00:00Z")]);
        let naive = dataset(&[("start-time", "2024-01-01T10:00:00")]);
        assert_eq!(data_instant(&zoned, "start-time"), Some(expected));
        assert_eq!(data_instant(&naive, "start-time"), Some(expected));
        assert_eq!(data_instant(&dataset(&[("start-time", "soon")]), "start-time"), None);
    }

    #[test]
    fn flags_require_literal_true() {
        let ds = dataset(&[("a", "true"), ("b", "yes")]);
        assert!(data_flag(&ds, "a"));
        assert!(!data_flag(&ds, "b"));
        assert!(!data_flag(&ds, "c"));
        assert_eq!(data_parse::<u64>(&dataset(&[("n", " 42 ")]), "n"), Some(42));
    }
}
