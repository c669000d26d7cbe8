//! Policy model
//!
//! Static definition of role permissions, inheritance, mutual-exclusion
//! constraints, and the role transition table. Pure and side-effect
//! free; the inheritance graph is validated for cycles once at load
//! time so request-time traversal never has to guard against them.

use super::types::{
    Permission, PermissionAction, Resource, Role, RoleConfig, RoleConstraintViolation,
    MAX_CUSTOM_PERMISSIONS,
};
use crate::utils::error::{PlatformError, Result};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Role pairs that may never be held simultaneously
const EXCLUSIVE_PAIRS: [(Role, Role); 1] = [(Role::Mentor, Role::Student)];

/// Static policy over roles, permissions, and transitions
#[derive(Debug, Clone)]
pub struct PolicyModel {
    /// Role definitions
    roles: HashMap<Role, RoleConfig>,
    /// Allowed transition targets per role
    transitions: HashMap<Role, Vec<Role>>,
    /// Version string stamped into cached permission sets
    version: String,
}

impl PolicyModel {
    /// Build the default platform policy
    pub fn new(version: impl Into<String>) -> Result<Self> {
        Self::with_configs(default_role_configs(), default_transitions(), version)
    }

    /// Build a policy from explicit role and transition tables
    ///
    /// Fails fast with a policy error if the inheritance graph contains
    /// a cycle or references an undefined role.
    pub fn with_configs(
        roles: HashMap<Role, RoleConfig>,
        transitions: HashMap<Role, Vec<Role>>,
        version: impl Into<String>,
    ) -> Result<Self> {
        let model = Self {
            roles,
            transitions,
            version: version.into(),
        };

        for role in model.roles.keys() {
            model.detect_inheritance_cycle(*role)?;
        }
        for config in model.roles.values() {
            for permission in &config.permissions {
                model.validate_permission(permission)?;
            }
        }

        info!(
            roles = model.roles.len(),
            version = %model.version,
            "policy model loaded"
        );
        Ok(model)
    }

    /// Policy version string
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Whether a role has a definition in the policy table
    pub fn is_defined(&self, role: Role) -> bool {
        self.roles.contains_key(&role)
    }

    /// Validate a permission's shape
    ///
    /// The resource and action are closed enums, so the remaining
    /// malformed inputs are condition maps with empty keys or values.
    pub fn validate_permission(&self, permission: &Permission) -> Result<()> {
        for (key, value) in &permission.conditions {
            if key.trim().is_empty() {
                return Err(PlatformError::policy(format!(
                    "invalid permission {permission}: condition key must not be empty"
                )));
            }
            if value.trim().is_empty() {
                return Err(PlatformError::policy(format!(
                    "invalid permission {permission}: condition `{key}` has an empty value"
                )));
            }
        }
        Ok(())
    }

    /// Validate a set of per-user custom grants
    pub fn validate_custom_permissions(&self, permissions: &[Permission]) -> Result<()> {
        if permissions.len() > MAX_CUSTOM_PERMISSIONS {
            return Err(PlatformError::policy(format!(
                "custom permission count {} exceeds the maximum of {}",
                permissions.len(),
                MAX_CUSTOM_PERMISSIONS
            )));
        }
        for permission in permissions {
            self.validate_permission(permission)?;
        }
        Ok(())
    }

    /// Effective permissions for a role: base plus transitively
    /// inherited, de-duplicated by (resource, action, conditions)
    pub fn role_permissions(&self, role: Role) -> Result<HashSet<Permission>> {
        let mut resolved = HashSet::new();
        let mut visited = HashSet::new();
        self.collect_role_permissions(role, &mut resolved, &mut visited)?;
        Ok(resolved)
    }

    fn collect_role_permissions(
        &self,
        role: Role,
        resolved: &mut HashSet<Permission>,
        visited: &mut HashSet<Role>,
    ) -> Result<()> {
        if !visited.insert(role) {
            return Ok(());
        }

        let config = self.role_config(role)?;
        resolved.extend(config.permissions.iter().cloned());
        for parent in &config.inherits {
            self.collect_role_permissions(*parent, resolved, visited)?;
        }
        Ok(())
    }

    /// Enforce the role-set invariants
    ///
    /// Returns the violation rather than an error so callers can
    /// surface a user-facing message directly.
    pub fn validate_role_constraints(&self, roles: &[Role]) -> Option<RoleConstraintViolation> {
        if roles.is_empty() {
            return Some(RoleConstraintViolation::EmptyRoleSet);
        }
        if roles.contains(&Role::Admin) && roles.len() > 1 {
            return Some(RoleConstraintViolation::AdminExclusive);
        }
        for (a, b) in EXCLUSIVE_PAIRS {
            if roles.contains(&a) && roles.contains(&b) {
                return Some(RoleConstraintViolation::MutuallyExclusive(a, b));
            }
        }
        None
    }

    /// Whether `to` is a declared transition target for `from`
    ///
    /// Every transition in this table requires administrative approval;
    /// there is no self-service upgrade path.
    pub fn is_valid_role_transition(&self, from: Role, to: Role) -> bool {
        self.transitions
            .get(&from)
            .map(|targets| targets.contains(&to))
            .unwrap_or(false)
    }

    /// Depth-first cycle check over the inheritance graph
    pub fn detect_inheritance_cycle(&self, role: Role) -> Result<()> {
        let mut stack = Vec::new();
        self.walk_inheritance(role, role, &mut stack)?;
        Ok(())
    }

    fn walk_inheritance(&self, origin: Role, current: Role, stack: &mut Vec<Role>) -> Result<()> {
        if stack.contains(&current) {
            return Err(PlatformError::policy(format!(
                "circular inheritance detected for role {origin}: {} -> {current}",
                stack
                    .iter()
                    .map(Role::as_str)
                    .collect::<Vec<_>>()
                    .join(" -> ")
            )));
        }

        stack.push(current);
        let config = self.role_config(current)?;
        for parent in &config.inherits {
            self.walk_inheritance(origin, *parent, stack)?;
        }
        stack.pop();
        Ok(())
    }

    fn role_config(&self, role: Role) -> Result<&RoleConfig> {
        self.roles.get(&role).ok_or_else(|| {
            debug!(%role, "role missing from policy table");
            PlatformError::policy(format!("invalid role: {role} is not defined in the policy"))
        })
    }
}

/// Default role policy for the platform
///
/// Every specialized role inherits the base USER permissions; ADMIN
/// stands alone with MANAGE on every resource.
pub fn default_role_configs() -> HashMap<Role, RoleConfig> {
    use PermissionAction::*;

    let mut roles = HashMap::new();

    roles.insert(
        Role::User,
        RoleConfig {
            permissions: vec![
                Permission::new(Resource::Courses, Read),
                Permission::new(Resource::Articles, Read),
                Permission::new(Resource::Products, Read),
                Permission::new(Resource::Reviews, Read),
                Permission::new(Resource::Reviews, Create),
                Permission::new(Resource::Users, Read).with_condition("scope", "own"),
                Permission::new(Resource::Users, Update).with_condition("scope", "own"),
            ],
            inherits: vec![],
        },
    );

    roles.insert(
        Role::Student,
        RoleConfig {
            permissions: vec![
                Permission::new(Resource::Sessions, Create),
                Permission::new(Resource::Sessions, Read),
                Permission::new(Resource::Orders, Create),
                Permission::new(Resource::Orders, Read).with_condition("scope", "own"),
            ],
            inherits: vec![Role::User],
        },
    );

    roles.insert(
        Role::Mentor,
        RoleConfig {
            permissions: vec![
                Permission::new(Resource::Sessions, Manage),
                Permission::new(Resource::Courses, Create),
                Permission::new(Resource::Courses, Update),
                Permission::new(Resource::Orders, Read),
            ],
            inherits: vec![Role::User],
        },
    );

    roles.insert(
        Role::Writer,
        RoleConfig {
            permissions: vec![
                Permission::new(Resource::Articles, Create),
                Permission::new(Resource::Articles, Update),
                Permission::new(Resource::Articles, Delete),
            ],
            inherits: vec![Role::User],
        },
    );

    roles.insert(
        Role::Seller,
        RoleConfig {
            permissions: vec![
                Permission::new(Resource::Products, Manage),
                Permission::new(Resource::Orders, Read),
                Permission::new(Resource::Orders, Update),
                Permission::new(Resource::Payouts, Read),
            ],
            inherits: vec![Role::User],
        },
    );

    roles.insert(
        Role::Admin,
        RoleConfig {
            permissions: vec![
                Permission::new(Resource::Courses, Manage),
                Permission::new(Resource::Sessions, Manage),
                Permission::new(Resource::Articles, Manage),
                Permission::new(Resource::Products, Manage),
                Permission::new(Resource::Orders, Manage),
                Permission::new(Resource::Reviews, Manage),
                Permission::new(Resource::Users, Manage),
                Permission::new(Resource::Applications, Manage),
                Permission::new(Resource::Payouts, Manage),
                Permission::new(Resource::Reports, Manage),
            ],
            inherits: vec![],
        },
    );

    roles
}

/// Default transition table: the base USER role may apply for any
/// specialized role; no role transitions into ADMIN
pub fn default_transitions() -> HashMap<Role, Vec<Role>> {
    let mut transitions = HashMap::new();
    transitions.insert(
        Role::User,
        vec![Role::Student, Role::Mentor, Role::Writer, Role::Seller],
    );
    transitions.insert(Role::Student, vec![]);
    transitions.insert(Role::Mentor, vec![]);
    transitions.insert(Role::Writer, vec![]);
    transitions.insert(Role::Seller, vec![]);
    transitions.insert(Role::Admin, vec![]);
    transitions
}
