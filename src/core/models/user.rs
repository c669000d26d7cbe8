//! User identity model
//!
//! Only the identity aspect the authorization engine needs: the role
//! set, custom grants, lifecycle status, and per-role verification
//! data. Profile and presentation fields live outside this core.

use crate::auth::rbac::{Permission, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// User lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// Account created but not yet verified
    PendingVerification,
    /// Account in good standing
    Active,
    /// Account suspended by an administrator
    Suspended,
}

/// Verification state attached to a specialized role
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleData {
    /// Whether the role has been verified through an approved application
    pub verified: bool,
    /// When verification happened
    pub verified_at: Option<DateTime<Utc>>,
}

/// User entity (identity aspect)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub user_id: String,
    /// User email
    pub email: String,
    /// Assigned roles, canonical order, never empty
    pub roles: Vec<Role>,
    /// Ad-hoc grants beyond role defaults, bounded in count
    pub custom_permissions: Vec<Permission>,
    /// Per-role verification data
    pub role_data: HashMap<Role, RoleData>,
    /// Lifecycle status
    pub status: UserStatus,
    /// Optimistic-concurrency version, bumped on every write
    pub version: u64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create an active user holding the base role
    pub fn new(email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: Uuid::new_v4().to_string(),
            email: email.into(),
            roles: vec![Role::User],
            custom_permissions: Vec::new(),
            role_data: HashMap::new(),
            status: UserStatus::Active,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the account is in good standing
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// Whether the user holds a role
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Specialized roles held by the user
    pub fn specialized_roles(&self) -> Vec<Role> {
        self.roles
            .iter()
            .copied()
            .filter(Role::is_specialized)
            .collect()
    }

    /// The role set that would result from granting `role`, in
    /// canonical order
    pub fn roles_with(&self, role: Role) -> Vec<Role> {
        let mut roles = self.roles.clone();
        if !roles.contains(&role) {
            roles.push(role);
        }
        roles.sort();
        roles
    }
}
