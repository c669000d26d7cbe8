//! Application workflow request types

use crate::auth::rbac::Role;
use crate::core::models::{ApplicationDocument, StepOutcome};
use serde::{Deserialize, Serialize};

/// A user's request to acquire a role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitApplication {
    /// Submitting user
    pub user_id: String,
    /// Requested role
    pub role: Role,
    /// Role-specific structured answers
    pub fields: serde_json::Value,
    /// Supporting documents, already uploaded to the blob store
    #[serde(default)]
    pub documents: Vec<ApplicationDocument>,
}

/// A reviewer's resolution of one verification step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepUpdate {
    /// Target application
    pub application_id: String,
    /// Step name
    pub step: String,
    /// Resolution applied to the step
    pub outcome: StepOutcome,
    /// Reviewer performing the update
    pub actor: String,
    /// Optional reviewer notes
    #[serde(default)]
    pub notes: Option<String>,
}
