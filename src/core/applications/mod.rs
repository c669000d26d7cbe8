//! Role-application workflow
//!
//! Submission, verification, approval, rejection, and withdrawal of
//! role applications, with atomic role grants on approval.

pub mod manager;
pub mod requirements;
pub mod types;


pub use manager::ApplicationManager;
pub use requirements::{
    requirements_for, validate_documents, ApplicationFields, MentorFields, RoleRequirements,
    SellerFields, StudentFields, WriterFields,
};
pub use types::{StepUpdate, SubmitApplication};
