//! Weekly teacher availability grid submitted as `DAY-SESSION` slot keys.

use std::collections::BTreeMap;

use super::{impl_any, Component, ComponentEvent, Dataset};
use crate::{
    errors::{ClientError, Result},
    wizard::Weekday,
};

pub const NO_SLOTS_MESSAGE: &str = "Please select at least one available time slot.";
pub const FEW_SLOTS_MESSAGE: &str =
    "You have selected fewer than 5 time slots. This may limit scheduling flexibility. Continue?";
pub const RECOMMENDED_MIN_SLOTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionCheck {
    Ready,
    /// Submittable after the user confirms `message`.
    NeedsConfirmation(String),
    Rejected(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilityMatrix {
    /// Selection order is kept; the hidden input lists slots as picked.
    selected: Vec<(Weekday, String)>,
}

impl AvailabilityMatrix {
    /// Seeds from `data-initial-matrix`. Malformed JSON yields an empty grid.
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let mut matrix = Self::default();
        if let Some(raw) = dataset.get("initial-matrix") {
            if let Err(err) = matrix.load_from_json(raw) {
                tracing::warn!(%err, "ignoring malformed availability matrix");
            }
        }
        matrix
    }

    /// `{"MONDAY":{"SESI_1":true}, ...}`; only `true` cells are selected.
    pub fn load_from_json(&mut self, raw: &str) -> Result<()> {
        let matrix: BTreeMap<String, BTreeMap<String, bool>> = serde_json::from_str(raw)
            .map_err(|err| ClientError::InvalidInput(format!("availability matrix: {}", err)))?;
        let mut by_day = Vec::new();
        for (day, sessions) in matrix {
            let day: Weekday = day.parse().map_err(ClientError::InvalidInput)?;
            by_day.push((day, sessions));
        }
        by_day.sort_by_key(|(day, _)| *day);
        for (day, sessions) in by_day {
            for (session, available) in sessions {
                if available {
                    self.select_slot(day, &session);
                }
            }
        }
        Ok(())
    }

    pub fn is_selected(&self, day: Weekday, session: &str) -> bool {
        self.position(day, session).is_some()
    }

    /// Returns whether the slot is selected afterwards.
    pub fn toggle_slot(&mut self, day: Weekday, session: &str) -> bool {
        match self.position(day, session) {
            Some(index) => {
                self.selected.remove(index);
                false
            }
            None => {
                self.selected.push((day, session.to_string()));
                true
            }
        }
    }

    pub fn select_slot(&mut self, day: Weekday, session: &str) {
        if !self.is_selected(day, session) {
            self.selected.push((day, session.to_string()));
        }
    }

    pub fn clear_all(&mut self) {
        self.selected.clear();
    }

    pub fn day_total(&self, day: Weekday) -> usize {
        self.selected.iter().filter(|(d, _)| *d == day).count()
    }

    pub fn day_totals(&self) -> BTreeMap<Weekday, usize> {
        Weekday::ALL
            .into_iter()
            .map(|day| (day, self.day_total(day)))
            .collect()
    }

    pub fn total_selected(&self) -> usize {
        self.selected.len()
    }

    /// Value of the hidden `availabilitySlots` input.
    pub fn hidden_input_value(&self) -> String {
        self.selected
            .iter()
            .map(|(day, session)| format!("{}-{}", day.code(), session))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn validate_submission(&self) -> SubmissionCheck {
        match self.total_selected() {
            0 => SubmissionCheck::Rejected(NO_SLOTS_MESSAGE.to_string()),
            n if n < RECOMMENDED_MIN_SLOTS => {
                SubmissionCheck::NeedsConfirmation(FEW_SLOTS_MESSAGE.to_string())
            }
            _ => SubmissionCheck::Ready,
        }
    }

    pub fn change_term(&self, term_id: &str) -> Option<ComponentEvent> {
        let term_id = term_id.trim();
        if term_id.is_empty() {
            return None;
        }
        Some(ComponentEvent::Redirect(format!(
            "/instructor/availability-submission?termId={}",
            term_id
        )))
    }

    fn position(&self, day: Weekday, session: &str) -> Option<usize> {
        self.selected
            .iter()
            .position(|(d, s)| *d == day && s == session)
    }
}

impl Component for AvailabilityMatrix {
    fn name(&self) -> &'static str {
        "availabilityMatrix"
    }

    impl_any!();
}
