//! Core entity models

pub mod application;
pub mod audit;
pub mod user;

pub use application::{
    ApplicationDocument, ApplicationStatus, DocumentKind, RoleApplication, StepOutcome,
    StepStatus, VerificationStep,
};
pub use audit::{AuditLogEntry, AuditOutcome};
pub use user::{RoleData, User, UserStatus};
