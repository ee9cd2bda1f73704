use super::{impl_any, redirect_on_auth, AlertKind, Component, ComponentEvent, Dataset};
use crate::transport::{api::TeacherAssignment, SessionApi, Transport, TransportError};

pub const ASSIGN_FAILURE_MESSAGE: &str = "An error occurred while assigning the teacher";

/// Teacher assignment dialog on the registration list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignModal {
    pub open: bool,
    pub registration_id: String,
    pub teacher_id: String,
    pub notes: String,
    pub show_error: bool,
    pub submitting: bool,
}

impl AssignModal {
    /// Opens for the `data-registration-id` of the clicked button.
    pub fn open_from_button(&mut self, button: &Dataset) -> bool {
        match button.get("registration-id").filter(|id| !id.trim().is_empty()) {
            Some(id) => {
                self.open_modal(id.clone());
                true
            }
            None => {
                tracing::error!("no registration id on assign button");
                false
            }
        }
    }

    pub fn open_modal(&mut self, registration_id: impl Into<String>) {
        *self = Self {
            open: true,
            registration_id: registration_id.into(),
            ..Self::default()
        };
    }

    pub fn close_modal(&mut self) {
        self.open = false;
    }

    pub fn locks_scroll(&self) -> bool {
        self.open
    }

    /// A teacher is required. Success closes the dialog and refreshes the
    /// search results.
    pub fn validate_and_submit(&mut self, transport: &Transport) -> Vec<ComponentEvent> {
        if self.teacher_id.trim().is_empty() {
            self.show_error = true;
            return Vec::new();
        }
        self.show_error = false;
        self.submitting = true;

        let outcome = SessionApi::new(transport).assign_teacher(
            &self.registration_id,
            &TeacherAssignment {
                teacher_id: self.teacher_id.clone(),
                assignment_notes: self.notes.clone(),
            },
        );
        self.submitting = false;

        match outcome {
            Ok(response) if response.is_success() => {
                tracing::info!(registration = %self.registration_id, teacher = %self.teacher_id, "teacher assigned");
                self.close_modal();
                vec![ComponentEvent::RefreshSearch]
            }
            Ok(response) => vec![ComponentEvent::alert(
                response
                    .message
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| ASSIGN_FAILURE_MESSAGE.to_string()),
                AlertKind::Error,
            )],
            Err(err) => {
                tracing::error!(registration = %self.registration_id, %err, "assignment failed");
                let message = match &err {
                    TransportError::Rejected { message, .. } => message.clone(),
                    _ => ASSIGN_FAILURE_MESSAGE.to_string(),
                };
                let mut events = vec![ComponentEvent::alert(message, AlertKind::Error)];
                events.extend(redirect_on_auth(&err));
                events
            }
        }
    }
}

impl Component for AssignModal {
    fn name(&self) -> &'static str {
        "assignModal"
    }

    impl_any!();
}
