//! Teacher review of a placement test: client-side checks and draft
//! auto-save while the review is in progress.

use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    components::timer::Interval,
    wizard::{validator::Rule, ValidationResult},
};

pub const MIN_REMARKS_CHARS: usize = 10;
pub const AUTOSAVE_PERIOD_MINUTES: i64 = 2;

pub const STATUS_FIELD: &str = "reviewStatus";
pub const REMARKS_FIELD: &str = "teacherRemarks";
pub const LEVEL_FIELD: &str = "recommendedLevelId";

pub const STATUS_REQUIRED_MESSAGE: &str = "Review status is required";
pub const REMARKS_TOO_SHORT_MESSAGE: &str = "Remarks must be at least 10 characters";
pub const LEVEL_REQUIRED_MESSAGE: &str = "A recommended level is required for a completed review";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewStatus {
    Pending,
    InReview,
    Completed,
    Rejected,
}

impl ReviewStatus {
    pub fn code(self) -> &'static str {
        match self {
            ReviewStatus::Pending => "PENDING",
            ReviewStatus::InReview => "IN_REVIEW",
            ReviewStatus::Completed => "COMPLETED",
            ReviewStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ReviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "PENDING" => Ok(ReviewStatus::Pending),
            "IN_REVIEW" => Ok(ReviewStatus::InReview),
            "COMPLETED" => Ok(ReviewStatus::Completed),
            "REJECTED" => Ok(ReviewStatus::Rejected),
            other => Err(format!("unknown review status `{}`", other)),
        }
    }
}

/// Live character count shown under the remarks box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemarksFeedback {
    pub count: usize,
    pub meets_minimum: bool,
}

impl RemarksFeedback {
    pub fn label(&self) -> String {
        format!("{} characters", self.count)
    }
}

/// Form payload submitted for one placement review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSubmission {
    pub review_status: ReviewStatus,
    pub teacher_remarks: String,
    pub recommended_level_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeacherReviewForm {
    pub status: Option<ReviewStatus>,
    pub remarks: String,
    pub recommended_level_id: Option<String>,
    autosave: Interval,
}

impl TeacherReviewForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Changing to `IN_REVIEW` starts the two-minute auto-save; any other
    /// status disposes of it.
    pub fn set_status(&mut self, status: Option<ReviewStatus>, now: DateTime<Utc>) {
        self.status = status;
        if status == Some(ReviewStatus::InReview) {
            if !self.autosave.is_active() {
                self.autosave = Interval::start(now, Duration::minutes(AUTOSAVE_PERIOD_MINUTES));
            }
        } else {
            self.autosave.cancel();
        }
    }

    pub fn set_remarks(&mut self, remarks: impl Into<String>) -> RemarksFeedback {
        self.remarks = remarks.into();
        self.remarks_feedback()
    }

    pub fn remarks_feedback(&self) -> RemarksFeedback {
        RemarksFeedback {
            count: self.remarks.chars().count(),
            meets_minimum: self.remarks_valid(),
        }
    }

    pub fn is_autosaving(&self) -> bool {
        self.autosave.is_active()
    }

    fn remarks_valid(&self) -> bool {
        Rule::NonEmpty.check(&self.remarks).is_ok()
            && Rule::MinLength(MIN_REMARKS_CHARS).check(&self.remarks).is_ok()
    }

    /// Checks run on submit. Use [`TeacherReviewForm::first_invalid`] to pick
    /// the field to focus.
    pub fn validate(&self) -> ValidationResult {
        let mut invalid = BTreeSet::new();
        let mut messages = Vec::new();

        if self.status.is_none() {
            invalid.insert(STATUS_FIELD.to_string());
            messages.push(STATUS_REQUIRED_MESSAGE.to_string());
        }
        if !self.remarks_valid() {
            invalid.insert(REMARKS_FIELD.to_string());
            messages.push(REMARKS_TOO_SHORT_MESSAGE.to_string());
        }
        let level_missing = self
            .recommended_level_id
            .as_deref()
            .map_or(true, |level| level.trim().is_empty());
        if self.status == Some(ReviewStatus::Completed) && level_missing {
            invalid.insert(LEVEL_FIELD.to_string());
            messages.push(LEVEL_REQUIRED_MESSAGE.to_string());
        }

        ValidationResult {
            is_valid: messages.is_empty(),
            invalid_fields: invalid,
            messages,
        }
    }

    /// The first offending field in form order.
    pub fn first_invalid(result: &ValidationResult) -> Option<&'static str> {
        [STATUS_FIELD, REMARKS_FIELD, LEVEL_FIELD]
            .into_iter()
            .find(|field| result.invalid_fields.contains(*field))
    }

    pub fn submit(&self) -> Result<ReviewSubmission, ValidationResult> {
        let result = self.validate();
        match self.status {
            Some(review_status) if result.is_valid => {
                tracing::info!(status = %review_status, "review submitted");
                Ok(ReviewSubmission {
                    review_status,
                    teacher_remarks: self.remarks.trim().to_string(),
                    recommended_level_id: self.recommended_level_id.clone(),
                })
            }
            _ => Err(result),
        }
    }

    /// Saving a draft always submits as `IN_REVIEW`, skipping validation.
    pub fn save_draft(&mut self, now: DateTime<Utc>) -> ReviewSubmission {
        self.set_status(Some(ReviewStatus::InReview), now);
        self.draft()
    }

    /// Returns a draft to persist when the auto-save is due and the remarks
    /// are long enough.
    pub fn poll_autosave(&mut self, now: DateTime<Utc>) -> Option<ReviewSubmission> {
        if !self.autosave.poll(now) || !self.remarks_valid() {
            return None;
        }
        tracing::debug!("auto-saving review draft");
        Some(self.draft())
    }

    pub fn dispose(&mut self) {
        self.autosave.cancel();
    }

    fn draft(&self) -> ReviewSubmission {
        ReviewSubmission {
            review_status: ReviewStatus::InReview,
            teacher_remarks: self.remarks.clone(),
            recommended_level_id: self.recommended_level_id.clone(),
        }
    }
}
