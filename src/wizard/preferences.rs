//! Repeated session-preference sub-forms.

use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub const PREFERENCE_PREFIX: &str = "sessionPreferences";
pub const SESSION_FIELD: &str = "sessionId";
pub const PRIORITY_FIELD: &str = "priority";
pub const DAYS_FIELD: &str = "preferredDays";

const LIMIT_MESSAGE: &str = "A maximum of 3 session preferences is allowed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Weekday::Monday => "MONDAY",
            Weekday::Tuesday => "TUESDAY",
            Weekday::Wednesday => "WEDNESDAY",
            Weekday::Thursday => "THURSDAY",
            Weekday::Friday => "FRIDAY",
            Weekday::Saturday => "SATURDAY",
            Weekday::Sunday => "SUNDAY",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Weekday::ALL
            .into_iter()
            .find(|day| day.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown weekday `{}`", s))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPreferenceEntry {
    pub index: usize,
    pub session_id: Option<String>,
    pub priority: Option<u8>,
    pub preferred_days: BTreeSet<Weekday>,
}

impl SessionPreferenceEntry {
    fn empty(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    pub fn has_session(&self) -> bool {
        self.session_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added(usize),
    LimitReached(String),
}

/// Name, id and label target of one rendered input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldBinding {
    pub name: String,
    pub id: String,
    pub label_for: String,
}

/// Everything index-dependent about one rendered entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryBindings {
    pub heading: String,
    pub badge: String,
    pub session: FieldBinding,
    pub priority: FieldBinding,
    pub days: Vec<(Weekday, FieldBinding)>,
}

pub fn field_name(index: usize, field: &str) -> String {
    format!("{}[{}].{}", PREFERENCE_PREFIX, index, field)
}

pub fn field_id(index: usize, field: &str) -> String {
    format!("{}{}.{}", PREFERENCE_PREFIX, index, field)
}

/// Splits `sessionPreferences[2].priority` into `(2, "priority")`.
pub fn parse_field_name(name: &str) -> Option<(usize, &str)> {
    let rest = name.strip_prefix(PREFERENCE_PREFIX)?.strip_prefix('[')?;
    let (index, field) = rest.split_once("].")?;
    Some((index.parse().ok()?, field))
}

/// Dense, ordered list of preference entries with a fixed upper bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceList {
    entries: Vec<SessionPreferenceEntry>,
    max: usize,
}

impl PreferenceList {
    pub fn new(max: usize) -> Self {
        Self {
            entries: vec![SessionPreferenceEntry::empty(0)],
            max: max.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn entries(&self) -> &[SessionPreferenceEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&SessionPreferenceEntry> {
        self.entries.get(index)
    }

    pub fn can_add(&self) -> bool {
        self.entries.len() < self.max
    }

    pub fn add(&mut self) -> AddOutcome {
        if !self.can_add() {
            return AddOutcome::LimitReached(limit_message(self.max));
        }
        let index = self.entries.len();
        self.entries.push(SessionPreferenceEntry::empty(index));
        tracing::debug!(index, "session preference added");
        AddOutcome::Added(index)
    }

    /// Drops one entry and closes the gap. The only remaining entry stays.
    pub fn remove(&mut self, index: usize) -> bool {
        if self.entries.len() <= 1 || index >= self.entries.len() {
            return false;
        }
        self.entries.remove(index);
        self.reindex();
        tracing::debug!(index, remaining = self.entries.len(), "session preference removed");
        true
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
        self.entries.push(SessionPreferenceEntry::empty(0));
    }

    pub fn set_session(&mut self, index: usize, session_id: Option<String>) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) => {
                entry.session_id = session_id.filter(|id| !id.trim().is_empty());
                true
            }
            None => false,
        }
    }

    pub fn set_priority(&mut self, index: usize, priority: Option<u8>) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) => {
                entry.priority = priority;
                true
            }
            None => false,
        }
    }

    pub fn toggle_day(&mut self, index: usize, day: Weekday, checked: bool) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) => {
                if checked {
                    entry.preferred_days.insert(day);
                } else {
                    entry.preferred_days.remove(&day);
                }
                true
            }
            None => false,
        }
    }

    pub fn has_selected_session(&self) -> bool {
        self.entries.iter().any(SessionPreferenceEntry::has_session)
    }

    pub fn bindings(&self, index: usize) -> Option<EntryBindings> {
        self.entries.get(index)?;
        let binding = |field: &str| {
            let id = field_id(index, field);
            FieldBinding {
                name: field_name(index, field),
                label_for: id.clone(),
                id,
            }
        };
        let days = Weekday::ALL
            .into_iter()
            .map(|day| {
                let id = format!("day_{}_{}", index, day.code());
                (
                    day,
                    FieldBinding {
                        name: field_name(index, DAYS_FIELD),
                        label_for: id.clone(),
                        id,
                    },
                )
            })
            .collect();
        Some(EntryBindings {
            heading: format!("Preference {}", index + 1),
            badge: format!("Priority {}", index + 1),
            session: binding(SESSION_FIELD),
            priority: binding(PRIORITY_FIELD),
            days,
        })
    }

    /// Flattens the list into form name/value pairs. Day sets are joined with
    /// commas in weekday order.
    pub fn form_entries(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for entry in &self.entries {
            pairs.push((
                field_name(entry.index, SESSION_FIELD),
                entry.session_id.clone().unwrap_or_default(),
            ));
            pairs.push((
                field_name(entry.index, PRIORITY_FIELD),
                entry.priority.map(|p| p.to_string()).unwrap_or_default(),
            ));
            if !entry.preferred_days.is_empty() {
                let days: Vec<&str> = entry.preferred_days.iter().map(|d| d.code()).collect();
                pairs.push((field_name(entry.index, DAYS_FIELD), days.join(",")));
            }
        }
        pairs
    }

    /// Applies one flattened pair to an existing entry. New entries only come
    /// from [`PreferenceList::add`].
    pub fn apply_field(&mut self, name: &str, value: &str) -> bool {
        match parse_field_name(name) {
            Some((index, field)) if index < self.entries.len() => {
                self.write_field(index, field, value)
            }
            _ => false,
        }
    }

    /// Applies one flattened pair from a stored draft, growing the list up to
    /// its bound.
    pub fn restore_field(&mut self, name: &str, value: &str) -> bool {
        let Some((index, field)) = parse_field_name(name) else {
            return false;
        };
        if index >= self.max {
            return false;
        }
        while self.entries.len() <= index {
            let next = self.entries.len();
            self.entries.push(SessionPreferenceEntry::empty(next));
        }
        self.write_field(index, field, value)
    }

    fn write_field(&mut self, index: usize, field: &str, value: &str) -> bool {
        match field {
            SESSION_FIELD => self.set_session(index, Some(value.to_string())),
            PRIORITY_FIELD => self.set_priority(index, value.trim().parse().ok()),
            DAYS_FIELD => {
                let days = value
                    .split(',')
                    .filter_map(|code| code.parse::<Weekday>().ok())
                    .collect();
                self.entries[index].preferred_days = days;
                true
            }
            _ => false,
        }
    }

    fn reindex(&mut self) {
        for (position, entry) in self.entries.iter_mut().enumerate() {
            entry.index = position;
        }
    }
}

fn limit_message(max: usize) -> String {
    if max == 3 {
        LIMIT_MESSAGE.to_string()
    } else {
        format!("A maximum of {} session preferences is allowed", max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fourth_add_is_refused() {
        let mut list = PreferenceList::new(3);
        assert_eq!(list.add(), AddOutcome::Added(1));
        assert_eq!(list.add(), AddOutcome::Added(2));
        assert!(matches!(list.add(), AddOutcome::LimitReached(_)));
        assert_eq!(list.len(), 3);
        assert!(!list.can_add());
    }

    #[test]
    fn removal_reindexes_in_relative_order() {
        let mut list = PreferenceList::new(3);
        list.add();
        list.add();
        list.set_session(0, Some("first".into()));
        list.set_session(1, Some("second".into()));
        list.set_session(2, Some("third".into()));

        assert!(list.remove(1));

        let sessions: Vec<_> = list
            .entries()
            .iter()
            .map(|e| (e.index, e.session_id.clone().unwrap()))
            .collect();
        assert_eq!(sessions, vec![(0, "first".into()), (1, "third".into())]);

        let bindings = list.bindings(1).unwrap();
        assert_eq!(bindings.heading, "Preference 2");
        assert_eq!(bindings.session.name, "sessionPreferences[1].sessionId");
        assert_eq!(bindings.session.id, "sessionPreferences1.sessionId");
        assert_eq!(bindings.session.label_for, bindings.session.id);
        assert_eq!(bindings.days[0].1.id, "day_1_MONDAY");
    }

    #[test]
    fn last_entry_cannot_be_removed() {
        let mut list = PreferenceList::new(3);
        assert!(!list.remove(0));
        assert_eq!(list.len(), 1);
        list.add();
        assert!(!list.remove(5));
    }

    #[test]
    fn clear_all_leaves_single_empty_entry() {
        let mut list = PreferenceList::new(3);
        list.add();
        list.set_session(1, Some("abc".into()));
        list.clear_all();
        assert_eq!(list.entries(), &[SessionPreferenceEntry::empty(0)]);
    }

    #[test]
    fn parse_field_name_handles_prefix() {
        assert_eq!(
            parse_field_name("sessionPreferences[2].priority"),
            Some((2, "priority"))
        );
        assert_eq!(parse_field_name("email"), None);
        assert_eq!(parse_field_name("sessionPreferences[x].priority"), None);
    }

    #[test]
    fn restore_field_rebuilds_flattened_entries() {
        let mut source = PreferenceList::new(3);
        source.add();
        source.set_session(1, Some("s-2".into()));
        source.set_priority(1, Some(2));
        source.toggle_day(1, Weekday::Friday, true);
        source.toggle_day(1, Weekday::Monday, true);

        let mut restored = PreferenceList::new(3);
        for (name, value) in source.form_entries() {
            restored.restore_field(&name, &value);
        }
        assert_eq!(restored, source);
    }

    #[test]
    fn restore_field_respects_bound() {
        let mut list = PreferenceList::new(3);
        assert!(!list.restore_field("sessionPreferences[3].sessionId", "x"));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn apply_field_never_creates_entries() {
        let mut list = PreferenceList::new(3);
        assert!(!list.apply_field("sessionPreferences[2].sessionId", "s-9"));
        assert!(!list.apply_field("sessionPreferences[1].priority", "2"));
        assert_eq!(list.len(), 1);
        assert!(list.apply_field("sessionPreferences[0].sessionId", "s-1"));
        assert!(list.has_selected_session());
    }

    #[test]
    fn blank_session_is_not_a_selection() {
        let mut list = PreferenceList::new(3);
        list.set_session(0, Some("  ".into()));
        assert!(!list.has_selected_session());
        list.set_session(0, Some("abc".into()));
        assert!(list.has_selected_session());
    }
}
