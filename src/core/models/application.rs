//! Role application aggregate
//!
//! A [`RoleApplication`] owns its ordered list of verification steps.
//! Step mutation goes through [`RoleApplication::resolve_step`] so the
//! "all steps resolved, recompute status" invariant lives in exactly
//! one place.

use crate::auth::rbac::Role;
use crate::utils::error::{PlatformError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Role application lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    /// Submitted, no verification step resolved yet
    Pending,
    /// At least one verification step resolved, others outstanding
    InReview,
    /// Terminal: role granted
    Approved,
    /// Terminal: application declined
    Rejected,
    /// Terminal: closed administratively
    Cancelled,
    /// Terminal: closed by the retention sweep
    Expired,
    /// Terminal: closed by the applicant
    Withdrawn,
}

impl ApplicationStatus {
    /// Whether the application can still change state
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::InReview)
    }

    /// Whether the state is terminal
    pub fn is_terminal(&self) -> bool {
        !self.is_open()
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::InReview => "in_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
            Self::Withdrawn => "withdrawn",
        };
        f.write_str(s)
    }
}

/// Verification step states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Completed,
    Failed,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// The resolution applied to a pending verification step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Completed,
    Failed,
}

impl From<StepOutcome> for StepStatus {
    fn from(outcome: StepOutcome) -> Self {
        match outcome {
            StepOutcome::Completed => StepStatus::Completed,
            StepOutcome::Failed => StepStatus::Failed,
        }
    }
}

/// One named checkpoint within an application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationStep {
    /// Step name (unique within the application)
    pub name: String,
    /// Current status
    pub status: StepStatus,
    /// Who resolved the step
    pub completed_by: Option<String>,
    /// When the step was resolved
    pub completed_at: Option<DateTime<Utc>>,
    /// Reviewer notes
    pub notes: Option<String>,
}

impl VerificationStep {
    /// Create a pending step
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: StepStatus::Pending,
            completed_by: None,
            completed_at: None,
            notes: None,
        }
    }
}

/// Document categories accepted by the application workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Resume,
    Certification,
    IdentityProof,
    WritingSample,
    BusinessLicense,
    TaxDocument,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Resume => "resume",
            Self::Certification => "certification",
            Self::IdentityProof => "identity_proof",
            Self::WritingSample => "writing_sample",
            Self::BusinessLicense => "business_license",
            Self::TaxDocument => "tax_document",
        };
        f.write_str(s)
    }
}

/// A document attached to an application
///
/// The engine stores only what the blob store returned; file contents
/// never pass through here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationDocument {
    /// Document category
    pub kind: DocumentKind,
    /// Storage URL returned by the blob store
    pub url: String,
    /// Original file name
    pub name: String,
    /// MIME type
    pub mime_type: String,
    /// Size in bytes
    pub size_bytes: u64,
}

/// A user's request to acquire a role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleApplication {
    /// Unique application identifier
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Requested role
    pub role: Role,
    /// Current status
    pub status: ApplicationStatus,
    /// Role-specific structured answers, validated at submission
    pub fields: serde_json::Value,
    /// Submitted documents
    pub documents: Vec<ApplicationDocument>,
    /// Ordered verification steps
    pub steps: Vec<VerificationStep>,
    /// Reviewer who finalized the application
    pub reviewed_by: Option<String>,
    /// When the application was finalized
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Reason recorded on rejection
    pub rejection_reason: Option<String>,
    /// Optimistic-concurrency version, bumped on every write
    pub version: u64,
    /// Submission timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl RoleApplication {
    /// Create a pending application with the given steps pre-populated
    pub fn new(
        user_id: impl Into<String>,
        role: Role,
        fields: serde_json::Value,
        documents: Vec<ApplicationDocument>,
        step_names: &[&str],
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            role,
            status: ApplicationStatus::Pending,
            fields,
            documents,
            steps: step_names
                .iter()
                .map(|name| VerificationStep::pending(*name))
                .collect(),
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Look up a step by name
    pub fn step(&self, name: &str) -> Option<&VerificationStep> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Whether any step is still pending
    pub fn has_pending_steps(&self) -> bool {
        self.steps.iter().any(|s| s.status == StepStatus::Pending)
    }

    /// Resolve a pending step and recompute the application status
    ///
    /// Returns the status the application landed on. Fails with a state
    /// conflict if the application is terminal or the step has already
    /// been resolved.
    pub fn resolve_step(
        &mut self,
        name: &str,
        outcome: StepOutcome,
        actor: &str,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ApplicationStatus> {
        if !self.status.is_open() {
            return Err(PlatformError::state_conflict(format!(
                "application {} is {}; verification steps can no longer be updated",
                self.id, self.status
            )));
        }

        let step = self
            .steps
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| {
                PlatformError::not_found(format!(
                    "verification step `{name}` does not exist on this application"
                ))
            })?;

        if step.status != StepStatus::Pending {
            return Err(PlatformError::state_conflict(format!(
                "verification step `{name}` is already {}",
                step.status
            )));
        }

        step.status = outcome.into();
        step.completed_by = Some(actor.to_string());
        step.completed_at = Some(now);
        step.notes = notes;

        self.recompute_status();
        self.updated_at = now;
        Ok(self.status)
    }

    /// Recompute status from the step list
    ///
    /// Any step still pending keeps the application in review. Once all
    /// steps are resolved, a single failure rejects the application;
    /// otherwise it is approved.
    fn recompute_status(&mut self) {
        if self.steps.iter().any(|s| s.status == StepStatus::Pending) {
            self.status = ApplicationStatus::InReview;
            return;
        }

        let failed: Vec<&str> = self
            .steps
            .iter()
            .filter(|s| s.status == StepStatus::Failed)
            .map(|s| s.name.as_str())
            .collect();

        if failed.is_empty() {
            self.status = ApplicationStatus::Approved;
        } else {
            self.status = ApplicationStatus::Rejected;
            if self.rejection_reason.is_none() {
                self.rejection_reason =
                    Some(format!("verification failed: {}", failed.join(", ")));
            }
        }
    }

    /// Finalize as approved
    pub fn mark_approved(&mut self, reviewer: Option<&str>, now: DateTime<Utc>) {
        self.status = ApplicationStatus::Approved;
        self.reviewed_by = reviewer.map(str::to_string);
        self.reviewed_at = Some(now);
        self.updated_at = now;
    }

    /// Finalize as rejected with a reason
    pub fn mark_rejected(&mut self, reviewer: Option<&str>, reason: String, now: DateTime<Utc>) {
        self.status = ApplicationStatus::Rejected;
        self.reviewed_by = reviewer.map(str::to_string);
        self.reviewed_at = Some(now);
        self.rejection_reason = Some(reason);
        self.updated_at = now;
    }

    /// Close administratively
    pub fn mark_cancelled(&mut self, now: DateTime<Utc>) {
        self.status = ApplicationStatus::Cancelled;
        self.updated_at = now;
    }

    /// Close by the retention sweep
    pub fn mark_expired(&mut self, now: DateTime<Utc>) {
        self.status = ApplicationStatus::Expired;
        self.updated_at = now;
    }
}
