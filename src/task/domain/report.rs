//! Completion reports and their administrative review.

use super::{AssignmentId, Hours, ParseStatusError, ReportId, TaskDomainError, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Review status of a completion report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Submitted and waiting for an administrator.
    PendingReview,
    /// Accepted; the assignment is approved.
    Approved,
    /// Refused; the task went back to the worker.
    Rejected,
    /// Flagged for correction without reopening the task.
    NeedsCorrection,
}

impl ReportStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingReview => "pending_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::NeedsCorrection => "needs_correction",
        }
    }
}

impl TryFrom<&str> for ReportStatus {
    type Error = ParseStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending_review" => Ok(Self::PendingReview),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "needs_correction" => Ok(Self::NeedsCorrection),
            _ => Err(ParseStatusError::new("report", value)),
        }
    }
}

/// Administrative verdict on a pending report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    /// Accept the work.
    Approve,
    /// Refuse the work and reopen the task for the same worker.
    Reject,
    /// Ask for corrections without touching the task.
    NeedsCorrection,
}

impl ReviewDecision {
    /// Report status produced by this decision.
    #[must_use]
    pub const fn resulting_status(self) -> ReportStatus {
        match self {
            Self::Approve => ReportStatus::Approved,
            Self::Reject => ReportStatus::Rejected,
            Self::NeedsCorrection => ReportStatus::NeedsCorrection,
        }
    }
}

/// Which reports a listing should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReportFilter {
    /// Every report regardless of status.
    All,
    /// Reports still waiting for review.
    #[default]
    PendingReview,
    /// Reports with the given status.
    Status(ReportStatus),
}

impl ReportFilter {
    /// Returns `true` when `status` passes the filter.
    #[must_use]
    pub fn matches(self, status: ReportStatus) -> bool {
        match self {
            Self::All => true,
            Self::PendingReview => status == ReportStatus::PendingReview,
            Self::Status(expected) => status == expected,
        }
    }
}

/// Worker-provided content of a completion report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSubmission {
    report_text: String,
    hours_worked: Hours,
    challenges_faced: String,
    solutions_applied: String,
}

impl ReportSubmission {
    /// Creates a validated submission.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyReportText`] when the text is blank or
    /// [`TaskDomainError::InvalidHoursWorked`] when `hours_worked` is zero.
    pub fn new(report_text: impl Into<String>, hours_worked: u32) -> Result<Self, TaskDomainError> {
        let raw = report_text.into();
        let text = raw.trim();
        if text.is_empty() {
            return Err(TaskDomainError::EmptyReportText);
        }
        let hours = Hours::new(hours_worked).ok_or(TaskDomainError::InvalidHoursWorked)?;
        Ok(Self {
            report_text: text.to_owned(),
            hours_worked: hours,
            challenges_faced: String::new(),
            solutions_applied: String::new(),
        })
    }

    /// Records the challenges the worker ran into.
    #[must_use]
    pub fn with_challenges(mut self, challenges: impl Into<String>) -> Self {
        self.challenges_faced = challenges.into();
        self
    }

    /// Records how the worker solved them.
    #[must_use]
    pub fn with_solutions(mut self, solutions: impl Into<String>) -> Self {
        self.solutions_applied = solutions.into();
        self
    }

    /// Returns the report body.
    #[must_use]
    pub fn report_text(&self) -> &str {
        &self.report_text
    }

    /// Returns the hours worked.
    #[must_use]
    pub const fn hours_worked(&self) -> Hours {
        self.hours_worked
    }

    /// Returns the challenges faced.
    #[must_use]
    pub fn challenges_faced(&self) -> &str {
        &self.challenges_faced
    }

    /// Returns the solutions applied.
    #[must_use]
    pub fn solutions_applied(&self) -> &str {
        &self.solutions_applied
    }
}

/// Completion report attached to exactly one assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    id: ReportId,
    assignment_id: AssignmentId,
    submission: ReportSubmission,
    status: ReportStatus,
    submitted_at: DateTime<Utc>,
    reviewed_at: Option<DateTime<Utc>>,
    reviewed_by: Option<UserId>,
    review_notes: String,
}

/// Parameter object for reconstructing a persisted report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedReportData {
    /// Persisted report identifier.
    pub id: ReportId,
    /// Assignment the report belongs to.
    pub assignment_id: AssignmentId,
    /// Worker-provided content.
    pub submission: ReportSubmission,
    /// Review status.
    pub status: ReportStatus,
    /// Submission timestamp.
    pub submitted_at: DateTime<Utc>,
    /// Review timestamp.
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Reviewing administrator.
    pub reviewed_by: Option<UserId>,
    /// Reviewer notes.
    pub review_notes: String,
}

impl Report {
    /// Creates a report awaiting review.
    #[must_use]
    pub fn submit(
        assignment_id: AssignmentId,
        submission: ReportSubmission,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: ReportId::new(),
            assignment_id,
            submission,
            status: ReportStatus::PendingReview,
            submitted_at: clock.utc(),
            reviewed_at: None,
            reviewed_by: None,
            review_notes: String::new(),
        }
    }

    /// Reconstructs a report from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedReportData) -> Self {
        Self {
            id: data.id,
            assignment_id: data.assignment_id,
            submission: data.submission,
            status: data.status,
            submitted_at: data.submitted_at,
            reviewed_at: data.reviewed_at,
            reviewed_by: data.reviewed_by,
            review_notes: data.review_notes,
        }
    }

    /// Returns the report identifier.
    #[must_use]
    pub const fn id(&self) -> ReportId {
        self.id
    }

    /// Returns the assignment this report completes.
    #[must_use]
    pub const fn assignment_id(&self) -> AssignmentId {
        self.assignment_id
    }

    /// Returns the submitted content.
    #[must_use]
    pub const fn submission(&self) -> &ReportSubmission {
        &self.submission
    }

    /// Returns the review status.
    #[must_use]
    pub const fn status(&self) -> ReportStatus {
        self.status
    }

    /// Returns the submission timestamp.
    #[must_use]
    pub const fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// Returns the review timestamp.
    #[must_use]
    pub const fn reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.reviewed_at
    }

    /// Returns the reviewing administrator.
    #[must_use]
    pub const fn reviewed_by(&self) -> Option<UserId> {
        self.reviewed_by
    }

    /// Returns the reviewer notes.
    #[must_use]
    pub fn review_notes(&self) -> &str {
        &self.review_notes
    }

    /// Replaces the content of a rejected report with a fresh submission
    /// and puts it back in the review queue.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::ReportAlreadyReviewed`] unless the report
    /// was rejected.
    pub fn resubmit(
        &mut self,
        submission: ReportSubmission,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if self.status != ReportStatus::Rejected {
            return Err(TaskDomainError::ReportAlreadyReviewed {
                report_id: self.id,
                status: self.status,
            });
        }
        self.submission = submission;
        self.status = ReportStatus::PendingReview;
        self.submitted_at = clock.utc();
        self.reviewed_at = None;
        self.reviewed_by = None;
        self.review_notes.clear();
        Ok(())
    }

    /// Records an administrator's decision.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::ReportAlreadyReviewed`] unless the report
    /// is pending review.
    pub fn review(
        &mut self,
        decision: ReviewDecision,
        reviewer: UserId,
        notes: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if self.status != ReportStatus::PendingReview {
            return Err(TaskDomainError::ReportAlreadyReviewed {
                report_id: self.id,
                status: self.status,
            });
        }
        self.status = decision.resulting_status();
        self.reviewed_at = Some(clock.utc());
        self.reviewed_by = Some(reviewer);
        self.review_notes = notes.into();
        Ok(())
    }
}
