//! Typed calls against the server endpoints used by the instructor and
//! registration pages.

use serde::{Deserialize, Serialize};

use super::{http::HttpRequest, Transport, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EquipmentType {
    Projector,
    SoundSystem,
    Microphone,
    Computer,
    Lighting,
    AirConditioning,
    Whiteboard,
    Furniture,
    Other,
}

impl EquipmentType {
    pub fn as_str(self) -> &'static str {
        match self {
            EquipmentType::Projector => "PROJECTOR",
            EquipmentType::SoundSystem => "SOUND_SYSTEM",
            EquipmentType::Microphone => "MICROPHONE",
            EquipmentType::Computer => "COMPUTER",
            EquipmentType::Lighting => "LIGHTING",
            EquipmentType::AirConditioning => "AIR_CONDITIONING",
            EquipmentType::Whiteboard => "WHITEBOARD",
            EquipmentType::Furniture => "FURNITURE",
            EquipmentType::Other => "OTHER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmergencyType {
    #[default]
    FireEvacuation,
    MedicalEmergency,
    NaturalDisaster,
    SecurityThreat,
    PowerOutage,
    BuildingEvacuation,
    WeatherEmergency,
    Other,
}

impl EmergencyType {
    pub fn as_str(self) -> &'static str {
        match self {
            EmergencyType::FireEvacuation => "FIRE_EVACUATION",
            EmergencyType::MedicalEmergency => "MEDICAL_EMERGENCY",
            EmergencyType::NaturalDisaster => "NATURAL_DISASTER",
            EmergencyType::SecurityThreat => "SECURITY_THREAT",
            EmergencyType::PowerOutage => "POWER_OUTAGE",
            EmergencyType::BuildingEvacuation => "BUILDING_EVACUATION",
            EmergencyType::WeatherEmergency => "WEATHER_EMERGENCY",
            EmergencyType::Other => "OTHER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscrepancyType {
    ExtraStudents,
    FewerStudents,
    NoDiscrepancy,
}

/// Server-held progress of one teaching session. Missing flags read as false.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionStateDto {
    pub is_checked_in: bool,
    pub is_started: bool,
    pub is_ended: bool,
    pub is_late: bool,
    pub check_in_time: Option<String>,
    pub start_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    pub location: String,
    pub arrival_time: String,
    pub late_reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckInResponse {
    pub success: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquipmentIssueReport {
    pub session_id: Option<String>,
    pub equipment_type: EquipmentType,
    pub description: String,
    pub is_urgent: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EquipmentIssueReceipt {
    pub success: bool,
    pub tracking_number: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmergencyTermination {
    pub session_id: String,
    pub emergency_type: EmergencyType,
    pub emergency_reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TerminationReceipt {
    pub success: bool,
    pub tracking_number: Option<String>,
    pub notifications_sent: Option<u32>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceCheck {
    pub session_id: String,
    pub actual_present_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscrepancyReport {
    pub discrepancy_type: DiscrepancyType,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub extra_student_count: u32,
    #[serde(default)]
    pub registered_student_count: u32,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeacherAssignment {
    pub teacher_id: String,
    pub assignment_notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignmentResponse {
    pub status: String,
    pub message: Option<String>,
}

impl AssignmentResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Borrowing facade over [`Transport`] for the session endpoints.
pub struct SessionApi<'a> {
    transport: &'a Transport,
}

impl<'a> SessionApi<'a> {
    pub fn new(transport: &'a Transport) -> Self {
        Self { transport }
    }

    pub fn session_state(&self, session_id: &str) -> Result<SessionStateDto, TransportError> {
        self.transport
            .send_json(HttpRequest::get(format!("/api/session/{}/state", session_id)))
    }

    pub fn check_in(&self, request: &CheckInRequest) -> Result<CheckInResponse, TransportError> {
        let request = HttpRequest::post_json("/instructor/check-in", request)
            .map_err(|err| TransportError::Decode(err.to_string()))?;
        self.transport.send_json(request)
    }

    /// The endpoint may answer with a rendered page; a 2xx without a JSON
    /// receipt still counts as reported.
    pub fn report_equipment_issue(
        &self,
        report: &EquipmentIssueReport,
    ) -> Result<EquipmentIssueReceipt, TransportError> {
        let mut fields = Vec::new();
        if let Some(session_id) = &report.session_id {
            fields.push(("sessionId", session_id.clone()));
        }
        fields.push(("equipmentType", report.equipment_type.as_str().to_string()));
        fields.push(("description", report.description.clone()));
        fields.push(("isUrgent", report.is_urgent.to_string()));

        let response = self.transport.send(HttpRequest::post_form(
            "/instructor/equipment-issue/report",
            fields,
        ))?;
        Ok(response.json().unwrap_or(EquipmentIssueReceipt {
            success: true,
            tracking_number: None,
            message: None,
        }))
    }

    pub fn terminate_emergency(
        &self,
        termination: &EmergencyTermination,
    ) -> Result<TerminationReceipt, TransportError> {
        self.transport.send_json(HttpRequest::post_form(
            "/api/emergency-termination/terminate",
            [
                ("sessionId", termination.session_id.clone()),
                ("emergencyType", termination.emergency_type.as_str().to_string()),
                ("emergencyReason", termination.emergency_reason.clone()),
            ],
        ))
    }

    pub fn check_attendance(
        &self,
        check: &AttendanceCheck,
    ) -> Result<DiscrepancyReport, TransportError> {
        self.transport.send_json(HttpRequest::post_form(
            "/api/attendance-discrepancy/check",
            [
                ("sessionId", check.session_id.clone()),
                ("actualPresentCount", check.actual_present_count.to_string()),
            ],
        ))
    }

    pub fn assign_teacher(
        &self,
        registration_id: &str,
        assignment: &TeacherAssignment,
    ) -> Result<AssignmentResponse, TransportError> {
        self.transport.send_json(HttpRequest::post_form(
            format!("/registrations/{}/assign", registration_id),
            [
                ("teacherId", assignment.teacher_id.clone()),
                ("assignmentNotes", assignment.assignment_notes.clone()),
            ],
        ))
    }
}
