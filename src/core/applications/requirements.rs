//! Per-role application requirements
//!
//! A closed set of strongly-typed field schemas, one variant per
//! applicable role, selected by a single dispatch on the requested
//! role, plus the static table of required documents and verification
//! steps. Changing this table is a policy change, not a runtime
//! concern.

use crate::auth::rbac::Role;
use crate::core::models::{ApplicationDocument, DocumentKind};
use crate::utils::error::{PlatformError, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Structured answers required from a mentor applicant
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorFields {
    /// Subject areas the mentor will teach
    pub expertise: Vec<String>,
    /// How the mentor structures sessions
    pub teaching_methodology: String,
    /// Years of professional experience
    pub years_of_experience: u32,
    /// Proposed session rate
    #[serde(default)]
    pub hourly_rate: Option<f64>,
    /// Public profile link
    #[serde(default)]
    pub linkedin_profile: Option<String>,
}

/// Structured answers required from a writer applicant
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriterFields {
    /// Topics the writer covers
    pub specialties: Vec<String>,
    /// Short author biography
    pub bio: String,
    /// Portfolio link
    #[serde(default)]
    pub portfolio_url: Option<String>,
}

/// Structured answers required from a seller applicant
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerFields {
    /// Storefront name
    pub store_name: String,
    /// Legal business type
    pub business_type: String,
    /// Product categories the seller will list
    pub product_categories: Vec<String>,
    /// Business website
    #[serde(default)]
    pub website: Option<String>,
}

/// Structured answers accepted from a student applicant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentFields {
    /// Learning interests
    #[serde(default)]
    pub interests: Vec<String>,
    /// Self-reported education level
    #[serde(default)]
    pub education_level: Option<String>,
}

/// Validated application fields, tagged by the requested role
#[derive(Debug, Clone)]
pub enum ApplicationFields {
    Student(StudentFields),
    Mentor(MentorFields),
    Writer(WriterFields),
    Seller(SellerFields),
}

impl ApplicationFields {
    /// Parse and validate a submission payload for the requested role
    ///
    /// A missing required field fails with a validation error naming
    /// the field.
    pub fn parse(role: Role, payload: &serde_json::Value) -> Result<Self> {
        let fields = match role {
            Role::Student => serde_json::from_value(payload.clone())
                .map(Self::Student)
                .map_err(field_error)?,
            Role::Mentor => serde_json::from_value(payload.clone())
                .map(Self::Mentor)
                .map_err(field_error)?,
            Role::Writer => serde_json::from_value(payload.clone())
                .map(Self::Writer)
                .map_err(field_error)?,
            Role::Seller => serde_json::from_value(payload.clone())
                .map(Self::Seller)
                .map_err(field_error)?,
            Role::User | Role::Admin => {
                return Err(PlatformError::policy(format!(
                    "role {role} is not acquired through applications"
                )))
            }
        };
        fields.check()?;
        Ok(fields)
    }

    /// Semantic checks serde cannot express
    fn check(&self) -> Result<()> {
        match self {
            Self::Student(_) => Ok(()),
            Self::Mentor(fields) => {
                if fields.expertise.is_empty() {
                    return Err(PlatformError::validation(
                        "field `expertise` must list at least one subject",
                    ));
                }
                if fields.teaching_methodology.trim().is_empty() {
                    return Err(PlatformError::validation(
                        "field `teachingMethodology` must not be blank",
                    ));
                }
                Ok(())
            }
            Self::Writer(fields) => {
                if fields.specialties.is_empty() {
                    return Err(PlatformError::validation(
                        "field `specialties` must list at least one topic",
                    ));
                }
                if fields.bio.trim().is_empty() {
                    return Err(PlatformError::validation("field `bio` must not be blank"));
                }
                Ok(())
            }
            Self::Seller(fields) => {
                if fields.store_name.trim().is_empty() {
                    return Err(PlatformError::validation(
                        "field `storeName` must not be blank",
                    ));
                }
                if fields.product_categories.is_empty() {
                    return Err(PlatformError::validation(
                        "field `productCategories` must list at least one category",
                    ));
                }
                Ok(())
            }
        }
    }
}

fn field_error(e: serde_json::Error) -> PlatformError {
    PlatformError::validation(format!("invalid application fields: {e}"))
}

/// Static per-role requirements consulted at submission time
#[derive(Debug, Clone)]
pub struct RoleRequirements {
    /// Document kinds that must all be present
    pub required_documents: &'static [DocumentKind],
    /// Verification steps pre-populated on the application, in order
    pub verification_steps: &'static [&'static str],
}

static REQUIREMENTS: Lazy<HashMap<Role, RoleRequirements>> = Lazy::new(|| {
    let mut table = HashMap::new();
    table.insert(
        Role::Student,
        RoleRequirements {
            required_documents: &[],
            verification_steps: &[],
        },
    );
    table.insert(
        Role::Mentor,
        RoleRequirements {
            required_documents: &[DocumentKind::Resume, DocumentKind::Certification],
            verification_steps: &["document_review", "background_check", "interview"],
        },
    );
    table.insert(
        Role::Writer,
        RoleRequirements {
            required_documents: &[DocumentKind::WritingSample],
            verification_steps: &["document_review", "sample_review"],
        },
    );
    table.insert(
        Role::Seller,
        RoleRequirements {
            required_documents: &[DocumentKind::BusinessLicense, DocumentKind::TaxDocument],
            verification_steps: &["document_review", "business_verification"],
        },
    );
    table
});

/// Requirements for a role, if the role accepts applications
pub fn requirements_for(role: Role) -> Option<&'static RoleRequirements> {
    REQUIREMENTS.get(&role)
}

/// Check submitted documents against the role's required set
///
/// Every required kind must be present and no unexpected kind is
/// accepted.
pub fn validate_documents(role: Role, documents: &[ApplicationDocument]) -> Result<()> {
    let requirements = requirements_for(role).ok_or_else(|| {
        PlatformError::policy(format!("role {role} is not acquired through applications"))
    })?;

    let submitted: HashSet<DocumentKind> = documents.iter().map(|d| d.kind).collect();

    for required in requirements.required_documents {
        if !submitted.contains(required) {
            return Err(PlatformError::validation(format!(
                "missing required document: {required}"
            )));
        }
    }
    for document in documents {
        if !requirements.required_documents.contains(&document.kind) {
            return Err(PlatformError::validation(format!(
                "unexpected document type: {}",
                document.kind
            )));
        }
    }
    Ok(())
}
