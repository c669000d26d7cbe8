//! # rolegate
//!
//! Role-based access control and role-application workflow engine for
//! multi-role marketplace platforms.
//!
//! ## Features
//!
//! - **Policy model**: closed role/resource/action enums, role
//!   inheritance with load-time cycle detection, mutual-exclusion
//!   constraints, and a static role transition table
//! - **Permission resolution**: effective permission sets (role union
//!   plus custom grants) memoized through a TTL-bounded, explicitly
//!   invalidated cache
//! - **Authorization guard**: in-memory allow/deny decisions with
//!   MANAGE subsumption and opaque denial messages
//! - **Role applications**: a multi-step verification state machine
//!   that grants roles atomically on approval
//! - **Audit trail**: best-effort append-only record of every
//!   authorization-relevant decision and transition
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use rolegate::{Config, Platform, SubmitApplication, Role};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let platform = Platform::new(Config::default()).await?;
//!
//!     let application = platform
//!         .applications()
//!         .submit(SubmitApplication {
//!             user_id: "user-1".into(),
//!             role: Role::Student,
//!             fields: json!({ "interests": ["backend"] }),
//!             documents: vec![],
//!         })
//!         .await?;
//!
//!     println!("application {} is {}", application.id, application.status);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod auth;
pub mod config;
pub mod core;
pub mod platform;
pub mod services;
pub mod storage;
pub mod utils;

// Re-export main types
pub use auth::{
    AccessControl, AccessDecision, DenialReason, Permission, PermissionAction, PermissionCache,
    PolicyModel, Resource, Role,
};
pub use config::Config;
pub use core::applications::{ApplicationManager, StepUpdate, SubmitApplication};
pub use core::models::{
    ApplicationDocument, ApplicationStatus, AuditLogEntry, AuditOutcome, DocumentKind,
    RoleApplication, StepOutcome, StepStatus, User, UserStatus, VerificationStep,
};
pub use platform::{MaintenanceReport, Platform};
pub use utils::error::{PlatformError, Result};
