//! Core domain: entity models and the role-application workflow

pub mod applications;
pub mod models;

pub use applications::{ApplicationManager, StepUpdate, SubmitApplication};
pub use models::{
    ApplicationDocument, ApplicationStatus, AuditLogEntry, AuditOutcome, DocumentKind,
    RoleApplication, StepOutcome, StepStatus, User, UserStatus, VerificationStep,
};
