//! Instructor session page: server-held session state, the check-in flow,
//! emergency handling and attendance.

use chrono::{DateTime, Duration, Utc};

use super::{
    countdown::SessionTimer, data_flag, data_instant, impl_any, redirect_on_auth, AlertKind,
    Component, ComponentEvent, Dataset, TickContext,
};
use crate::{
    errors::ClientError,
    transport::{
        api::{
            AttendanceCheck, CheckInRequest, DiscrepancyReport, EmergencyTermination,
            EmergencyType, EquipmentIssueReport, EquipmentType, SessionStateDto,
        },
        SessionApi, Transport, TransportError,
    },
};

pub const CHECK_IN_FIELDS_MESSAGE: &str = "Arrival time and location are required";
pub const LATE_REASON_MESSAGE: &str = "A reason is required for a late check-in";
pub const CHECK_IN_FAILED_MESSAGE: &str = "Check-in failed";
pub const CHECK_IN_SUCCESS_MESSAGE: &str = "Check-in successful!";
pub const LATE_CHECK_IN_SUCCESS_MESSAGE: &str = "Late check-in recorded";
pub const CHECK_IN_FIRST_MESSAGE: &str = "You must check in first";
pub const EQUIPMENT_FIELDS_MESSAGE: &str = "Equipment type and issue description are required";
pub const EQUIPMENT_REPORTED_MESSAGE: &str = "Equipment issue reported";
pub const EMERGENCY_FIELDS_MESSAGE: &str = "Emergency type and reason are required";
pub const EMERGENCY_TERMINATED_MESSAGE: &str = "Session terminated due to emergency";
pub const NO_SESSION_MESSAGE: &str = "No session is selected";
pub const SESSION_ENDED_MESSAGE: &str = "This session has been terminated";

pub const DEFAULT_GRACE_MINUTES: i64 = 15;

/// Client-side lateness check used when the page carries no server flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatenessRule {
    pub start: DateTime<Utc>,
    pub grace: Duration,
}

impl LatenessRule {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            start,
            grace: Duration::minutes(DEFAULT_GRACE_MINUTES),
        }
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Strictly after start plus grace.
    pub fn is_late(&self, now: DateTime<Utc>) -> bool {
        now > self.start + self.grace
    }
}

/// Mirror of the server's view of one session plus the page's modal flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub session_id: String,
    pub state: SessionStateDto,
    pub show_check_in_modal: bool,
    pub show_end_session_modal: bool,
    pub show_emergency_modal: bool,
    pub show_equipment_modal: bool,
    pub show_guest_modal: bool,
    loaded: bool,
}

impl SessionState {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        Self {
            session_id: dataset.get("session-id").cloned().unwrap_or_default(),
            ..Self::default()
        }
    }

    /// Replaces local state with the server's. Without a session id this is
    /// a no-op.
    pub fn load(&mut self, transport: &Transport) -> Result<(), TransportError> {
        self.loaded = true;
        if self.session_id.is_empty() {
            return Ok(());
        }
        let state = SessionApi::new(transport).session_state(&self.session_id)?;
        tracing::debug!(session = %self.session_id, ?state, "session state loaded");
        self.state = state;
        Ok(())
    }

    pub fn on_check_in(&mut self, now: DateTime<Utc>) {
        self.state.is_checked_in = true;
        self.state.check_in_time = Some(now.to_rfc3339());
        self.show_check_in_modal = false;
    }

    pub fn on_session_start(&mut self, now: DateTime<Utc>) {
        self.state.is_started = true;
        self.state.start_time = Some(now.to_rfc3339());
    }

    pub fn on_session_end(&mut self) {
        self.state.is_ended = true;
        self.show_end_session_modal = false;
    }

    pub fn close_all_modals(&mut self) {
        self.show_check_in_modal = false;
        self.show_end_session_modal = false;
        self.show_emergency_modal = false;
        self.show_equipment_modal = false;
        self.show_guest_modal = false;
    }

    pub fn locks_scroll(&self) -> bool {
        self.show_check_in_modal
            || self.show_end_session_modal
            || self.show_emergency_modal
            || self.show_equipment_modal
            || self.show_guest_modal
    }
}

impl Component for SessionState {
    fn name(&self) -> &'static str {
        "sessionState"
    }

    /// Loads once, on the first tick that has a transport.
    fn tick(&mut self, ctx: &TickContext<'_>) -> Vec<ComponentEvent> {
        let Some(transport) = ctx.transport.filter(|_| !self.loaded) else {
            return Vec::new();
        };
        match self.load(transport) {
            Ok(()) => Vec::new(),
            Err(err) => {
                tracing::error!(session = %self.session_id, %err, "failed to load session state");
                redirect_on_auth(&err).into_iter().collect()
            }
        }
    }

    impl_any!();
}

/// Buttons that go dead once a session is terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionControl {
    CheckIn,
    StartSession,
    EndSession,
    EmergencyOptions,
}

/// The instructor's controls for today's session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionManagement {
    pub session_id: Option<String>,
    pub is_late: bool,
    pub is_checked_in: bool,
    pub is_started: bool,
    pub is_terminated: bool,
    pub submitting: bool,

    pub check_in_modal_open: bool,
    pub emergency_menu_open: bool,
    pub equipment_form_open: bool,
    pub emergency_termination_open: bool,

    pub arrival_time: String,
    pub location: String,
    pub late_reason: String,
    pub validation_error: Option<String>,

    pub equipment_type: Option<EquipmentType>,
    pub equipment_description: String,
    pub is_urgent: bool,
    pub last_tracking_number: Option<String>,

    pub emergency_type: Option<EmergencyType>,
    pub emergency_reason: String,

    pub present_count: u32,
    pub total_students: u32,
    pub discrepancy: Option<DiscrepancyReport>,

    checked_in_at: Option<DateTime<Utc>>,
    started_at: Option<DateTime<Utc>>,
    timer: SessionTimer,
}

fn arrival_clock(now: DateTime<Utc>) -> String {
    now.format("%H:%M").to_string()
}

impl SessionManagement {
    pub fn new(session_id: Option<String>, is_late: bool, now: DateTime<Utc>) -> Self {
        Self {
            session_id,
            is_late,
            is_checked_in: false,
            is_started: false,
            is_terminated: false,
            submitting: false,
            check_in_modal_open: false,
            emergency_menu_open: false,
            equipment_form_open: false,
            emergency_termination_open: false,
            arrival_time: arrival_clock(now),
            location: String::new(),
            late_reason: String::new(),
            validation_error: None,
            equipment_type: None,
            equipment_description: String::new(),
            is_urgent: false,
            last_tracking_number: None,
            emergency_type: Some(EmergencyType::default()),
            emergency_reason: String::new(),
            present_count: 0,
            total_students: 0,
            discrepancy: None,
            checked_in_at: None,
            started_at: None,
            timer: SessionTimer::default(),
        }
    }

    /// `data-is-late` wins; without it, `data-session-start` is checked
    /// against the default grace period.
    pub fn from_dataset(dataset: &Dataset, now: DateTime<Utc>) -> Self {
        let is_late = if dataset.contains_key("is-late") {
            data_flag(dataset, "is-late")
        } else {
            data_instant(dataset, "session-start")
                .is_some_and(|start| LatenessRule::new(start).is_late(now))
        };
        let session_id = dataset
            .get("session-id")
            .filter(|id| !id.trim().is_empty())
            .cloned();
        Self::new(session_id, is_late, now)
    }

    pub fn is_enabled(&self, control: SessionControl) -> bool {
        if self.is_terminated {
            return false;
        }
        match control {
            SessionControl::CheckIn => !self.is_checked_in,
            SessionControl::StartSession => self.is_checked_in && !self.is_started,
            SessionControl::EndSession => self.is_started,
            SessionControl::EmergencyOptions => true,
        }
    }

    pub fn locks_scroll(&self) -> bool {
        self.check_in_modal_open
            || self.emergency_menu_open
            || self.equipment_form_open
            || self.emergency_termination_open
    }

    pub fn elapsed(&self) -> String {
        self.timer.formatted()
    }

    pub fn checked_in_at(&self) -> Option<DateTime<Utc>> {
        self.checked_in_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    // Check-in

    pub fn open_check_in_modal(&mut self, now: DateTime<Utc>) {
        if !self.is_enabled(SessionControl::CheckIn) {
            return;
        }
        self.check_in_modal_open = true;
        self.validation_error = None;
        self.arrival_time = arrival_clock(now);
    }

    pub fn close_check_in_modal(&mut self, now: DateTime<Utc>) {
        self.check_in_modal_open = false;
        self.reset_check_in_form(now);
    }

    pub fn reset_check_in_form(&mut self, now: DateTime<Utc>) {
        self.location.clear();
        self.late_reason.clear();
        self.validation_error = None;
        self.arrival_time = arrival_clock(now);
    }

    /// Late reason is highlighted when this returns the late-reason error.
    pub fn validate_check_in(&self) -> Result<(), &'static str> {
        if self.arrival_time.trim().is_empty() || self.location.trim().is_empty() {
            return Err(CHECK_IN_FIELDS_MESSAGE);
        }
        if self.is_late && self.late_reason.trim().is_empty() {
            return Err(LATE_REASON_MESSAGE);
        }
        Ok(())
    }

    pub fn perform_check_in(
        &mut self,
        transport: &Transport,
        now: DateTime<Utc>,
    ) -> Vec<ComponentEvent> {
        if self.is_terminated {
            return vec![ComponentEvent::alert(SESSION_ENDED_MESSAGE, AlertKind::Error)];
        }
        if let Err(message) = self.validate_check_in() {
            self.validation_error = Some(message.to_string());
            return Vec::new();
        }

        self.submitting = true;
        self.validation_error = None;
        let request = CheckInRequest {
            location: self.location.trim().to_string(),
            arrival_time: self.arrival_time.clone(),
            late_reason: self.late_reason.trim().to_string(),
        };
        let outcome = SessionApi::new(transport).check_in(&request);
        self.submitting = false;

        match outcome {
            Ok(response) if response.success => {
                tracing::info!(late = self.is_late, "checked in");
                self.is_checked_in = true;
                self.checked_in_at = Some(now);
                self.timer.start_at(now, now);
                self.close_check_in_modal(now);
                let message = if self.is_late {
                    LATE_CHECK_IN_SUCCESS_MESSAGE
                } else {
                    CHECK_IN_SUCCESS_MESSAGE
                };
                vec![ComponentEvent::alert(message, AlertKind::Success)]
            }
            Ok(response) => {
                self.validation_error = Some(
                    response
                        .message
                        .filter(|message| !message.trim().is_empty())
                        .unwrap_or_else(|| CHECK_IN_FAILED_MESSAGE.to_string()),
                );
                Vec::new()
            }
            Err(err) => {
                self.validation_error = Some(err.user_message());
                redirect_on_auth(&err).into_iter().collect()
            }
        }
    }

    // Session start and attendance

    pub fn start_session(&mut self, now: DateTime<Utc>) -> Vec<ComponentEvent> {
        if self.is_terminated {
            return vec![ComponentEvent::alert(SESSION_ENDED_MESSAGE, AlertKind::Error)];
        }
        if !self.is_checked_in {
            return vec![ComponentEvent::alert(CHECK_IN_FIRST_MESSAGE, AlertKind::Error)];
        }
        self.is_started = true;
        self.started_at = Some(now);
        self.update_attendance(0, 0);
        Vec::new()
    }

    pub fn update_attendance(&mut self, present: u32, total: u32) {
        self.present_count = present;
        self.total_students = total;
    }

    pub fn attendance_label(&self) -> String {
        format!("{}/{} Present", self.present_count, self.total_students)
    }

    /// Asks the server whether the present count matches the roster. Failures
    /// surface to the caller; no report is invented. Without a session id
    /// nothing is sent and the error is [`ClientError::InvalidInput`].
    pub fn check_attendance_discrepancy(
        &mut self,
        transport: &Transport,
    ) -> crate::errors::Result<&DiscrepancyReport> {
        let session_id = self
            .session_id
            .clone()
            .ok_or_else(|| ClientError::InvalidInput(NO_SESSION_MESSAGE.to_string()))?;
        let report = SessionApi::new(transport).check_attendance(&AttendanceCheck {
            session_id,
            actual_present_count: self.present_count,
        })?;
        tracing::debug!(kind = ?report.discrepancy_type, "attendance checked");
        Ok(&*self.discrepancy.insert(report))
    }

    // Emergency options

    pub fn open_emergency_menu(&mut self) {
        if self.is_enabled(SessionControl::EmergencyOptions) {
            self.emergency_menu_open = true;
        }
    }

    pub fn close_emergency_menu(&mut self) {
        self.emergency_menu_open = false;
    }

    pub fn select_equipment_issue(&mut self) {
        self.close_emergency_menu();
        self.equipment_form_open = true;
    }

    pub fn close_equipment_form(&mut self) {
        self.equipment_form_open = false;
        self.equipment_type = None;
        self.equipment_description.clear();
        self.is_urgent = false;
    }

    pub fn submit_equipment_issue(&mut self, transport: &Transport) -> Vec<ComponentEvent> {
        let Some(equipment_type) = self
            .equipment_type
            .filter(|_| !self.equipment_description.trim().is_empty())
        else {
            return vec![ComponentEvent::alert(EQUIPMENT_FIELDS_MESSAGE, AlertKind::Error)];
        };

        self.submitting = true;
        let report = EquipmentIssueReport {
            session_id: self.session_id.clone(),
            equipment_type,
            description: self.equipment_description.trim().to_string(),
            is_urgent: self.is_urgent,
        };
        let outcome = SessionApi::new(transport).report_equipment_issue(&report);
        self.submitting = false;

        match outcome {
            Ok(receipt) if receipt.success => {
                tracing::info!(?equipment_type, urgent = report.is_urgent, "equipment issue reported");
                self.last_tracking_number = receipt.tracking_number.clone();
                self.close_equipment_form();
                let message = match receipt.tracking_number {
                    Some(tracking) => format!("{}. Tracking: {}", EQUIPMENT_REPORTED_MESSAGE, tracking),
                    None => EQUIPMENT_REPORTED_MESSAGE.to_string(),
                };
                vec![ComponentEvent::alert(message, AlertKind::Success)]
            }
            Ok(receipt) => vec![ComponentEvent::alert(
                receipt
                    .message
                    .unwrap_or_else(|| crate::transport::GENERIC_FAILURE_MESSAGE.to_string()),
                AlertKind::Error,
            )],
            Err(err) => failure_events(&err),
        }
    }

    pub fn select_emergency_termination(&mut self) {
        self.close_emergency_menu();
        self.emergency_termination_open = true;
    }

    pub fn close_emergency_termination(&mut self) {
        self.emergency_termination_open = false;
        self.emergency_reason.clear();
        self.emergency_type = Some(EmergencyType::default());
    }

    pub fn confirm_emergency_termination(&mut self, transport: &Transport) -> Vec<ComponentEvent> {
        let Some(emergency_type) = self
            .emergency_type
            .filter(|_| !self.emergency_reason.trim().is_empty())
        else {
            return vec![ComponentEvent::alert(EMERGENCY_FIELDS_MESSAGE, AlertKind::Error)];
        };
        let Some(session_id) = self.session_id.clone() else {
            return vec![ComponentEvent::alert(NO_SESSION_MESSAGE, AlertKind::Error)];
        };

        self.submitting = true;
        let outcome = SessionApi::new(transport).terminate_emergency(&EmergencyTermination {
            session_id,
            emergency_type,
            emergency_reason: self.emergency_reason.trim().to_string(),
        });
        self.submitting = false;

        match outcome {
            Ok(receipt) if receipt.success => {
                tracing::warn!(?emergency_type, tracking = ?receipt.tracking_number, "session terminated");
                self.is_started = false;
                self.is_terminated = true;
                self.last_tracking_number = receipt.tracking_number;
                self.timer.stop();
                self.close_emergency_termination();
                vec![ComponentEvent::alert(
                    EMERGENCY_TERMINATED_MESSAGE,
                    AlertKind::Warning,
                )]
            }
            Ok(receipt) => vec![ComponentEvent::alert(
                receipt
                    .message
                    .unwrap_or_else(|| crate::transport::GENERIC_FAILURE_MESSAGE.to_string()),
                AlertKind::Error,
            )],
            Err(err) => failure_events(&err),
        }
    }

    pub fn close_all_modals(&mut self) {
        self.check_in_modal_open = false;
        self.emergency_menu_open = false;
        self.equipment_form_open = false;
        self.emergency_termination_open = false;
    }
}

fn failure_events(err: &TransportError) -> Vec<ComponentEvent> {
    let mut events = vec![ComponentEvent::alert(err.user_message(), AlertKind::Error)];
    events.extend(redirect_on_auth(err));
    events
}

impl Component for SessionManagement {
    fn name(&self) -> &'static str {
        "sessionManagement"
    }

    fn tick(&mut self, ctx: &TickContext<'_>) -> Vec<ComponentEvent> {
        self.timer.tick(ctx)
    }

    fn destroy(&mut self) {
        self.timer.destroy();
    }

    impl_any!();
}
