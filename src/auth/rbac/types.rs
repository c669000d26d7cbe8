//! RBAC type definitions
//!
//! Closed enumerations for roles, resources, and actions, plus the
//! permission tuple and role configuration types. Keeping these as
//! enums (not strings) means exhaustiveness checks catch missing cases
//! at compile time.

use crate::utils::error::PlatformError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Upper bound on per-user custom permission grants
pub const MAX_CUSTOM_PERMISSIONS: usize = 50;

/// Roles assignable to platform users
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Base role every account holds
    User,
    /// Learner enrolled in sessions and courses
    Student,
    /// Teaching mentor offering sessions
    Mentor,
    /// Content writer publishing articles
    Writer,
    /// Marketplace seller listing products
    Seller,
    /// Platform administrator
    Admin,
}

impl Role {
    /// All roles, in canonical assignment order
    pub const ALL: [Role; 6] = [
        Role::User,
        Role::Student,
        Role::Mentor,
        Role::Writer,
        Role::Seller,
        Role::Admin,
    ];

    /// Whether this role is acquired through the application workflow
    pub fn is_specialized(&self) -> bool {
        matches!(
            self,
            Role::Student | Role::Mentor | Role::Writer | Role::Seller
        )
    }

    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Student => "student",
            Role::Mentor => "mentor",
            Role::Writer => "writer",
            Role::Seller => "seller",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "student" => Ok(Role::Student),
            "mentor" => Ok(Role::Mentor),
            "writer" => Ok(Role::Writer),
            "seller" => Ok(Role::Seller),
            "admin" => Ok(Role::Admin),
            other => Err(PlatformError::policy(format!(
                "unrecognized role: {other}"
            ))),
        }
    }
}

/// Protected resource types
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Courses,
    Sessions,
    Articles,
    Products,
    Orders,
    Reviews,
    Users,
    Applications,
    Payouts,
    Reports,
}

impl Resource {
    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Courses => "courses",
            Resource::Sessions => "sessions",
            Resource::Articles => "articles",
            Resource::Products => "products",
            Resource::Orders => "orders",
            Resource::Reviews => "reviews",
            Resource::Users => "users",
            Resource::Applications => "applications",
            Resource::Payouts => "payouts",
            Resource::Reports => "reports",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Actions a permission can grant on a resource
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PermissionAction {
    Create,
    Read,
    Update,
    Delete,
    /// Subsumes every other action on the same resource
    Manage,
}

impl fmt::Display for PermissionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PermissionAction::Create => "create",
            PermissionAction::Read => "read",
            PermissionAction::Update => "update",
            PermissionAction::Delete => "delete",
            PermissionAction::Manage => "manage",
        };
        f.write_str(s)
    }
}

/// A single authorization unit: (resource, action, optional conditions)
///
/// Identity (equality and hashing) covers the full triple, so two
/// permissions on the same resource/action with different conditions
/// are distinct entries in a resolved set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Permission {
    /// Resource this permission applies to
    pub resource: Resource,
    /// Action this permission allows
    pub action: PermissionAction,
    /// Optional flat key/value map for attribute-based restriction
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub conditions: BTreeMap<String, String>,
}

impl Permission {
    /// Create an unconditional permission
    pub fn new(resource: Resource, action: PermissionAction) -> Self {
        Self {
            resource,
            action,
            conditions: BTreeMap::new(),
        }
    }

    /// Attach a condition entry
    pub fn with_condition(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.insert(key.into(), value.into());
        self
    }

    /// Whether this permission satisfies a required (resource, action)
    /// pair, honoring MANAGE subsumption
    pub fn grants(&self, resource: Resource, action: PermissionAction) -> bool {
        self.resource == resource
            && (self.action == action || self.action == PermissionAction::Manage)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource, self.action)
    }
}

/// Per-role policy entry: base permissions plus inherited roles
#[derive(Debug, Clone, Default)]
pub struct RoleConfig {
    /// Permissions granted directly by this role
    pub permissions: Vec<Permission>,
    /// Roles whose permissions this role inherits (transitively)
    pub inherits: Vec<Role>,
}

/// A role-set invariant violation, surfaced to callers as a message
/// rather than an error so user-facing flows can report it directly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleConstraintViolation {
    /// A user's role set must never be empty
    EmptyRoleSet,
    /// ADMIN cannot coexist with any other role
    AdminExclusive,
    /// Two roles declared mutually exclusive are both present
    MutuallyExclusive(Role, Role),
}

impl fmt::Display for RoleConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRoleSet => write!(f, "role set must not be empty"),
            Self::AdminExclusive => {
                write!(f, "the admin role cannot be combined with any other role")
            }
            Self::MutuallyExclusive(a, b) => {
                write!(f, "roles {a} and {b} are mutually exclusive")
            }
        }
    }
}
