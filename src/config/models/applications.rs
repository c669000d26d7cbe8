//! Role-application workflow configuration

use crate::auth::rbac::Role;
use crate::config::validation::Validate;
use serde::{Deserialize, Serialize};

/// Role-application workflow configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationsConfig {
    /// Roles granted immediately at submission, skipping verification
    #[serde(default = "default_auto_approve_roles")]
    pub auto_approve_roles: Vec<Role>,
    /// Bounded retries for optimistic-concurrency commit conflicts
    #[serde(default = "default_max_commit_retries")]
    pub max_commit_retries: u32,
    /// Age in days after which open applications expire
    #[serde(default = "default_application_ttl_days")]
    pub application_ttl_days: u32,
}

impl ApplicationsConfig {
    /// Whether a role skips verification at submission
    pub fn is_auto_approved(&self, role: Role) -> bool {
        self.auto_approve_roles.contains(&role)
    }
}

impl Default for ApplicationsConfig {
    fn default() -> Self {
        Self {
            auto_approve_roles: default_auto_approve_roles(),
            max_commit_retries: default_max_commit_retries(),
            application_ttl_days: default_application_ttl_days(),
        }
    }
}

impl Validate for ApplicationsConfig {
    fn validate(&self) -> Result<(), String> {
        for role in &self.auto_approve_roles {
            if !role.is_specialized() {
                return Err(format!(
                    "auto-approve role {role} is not acquired through applications"
                ));
            }
        }
        if self.max_commit_retries == 0 || self.max_commit_retries > 10 {
            return Err("commit retries must be between 1 and 10".to_string());
        }
        if self.application_ttl_days == 0 {
            return Err("application TTL must be at least one day".to_string());
        }
        Ok(())
    }
}

fn default_auto_approve_roles() -> Vec<Role> {
    vec![Role::Student]
}

fn default_max_commit_retries() -> u32 {
    3
}

fn default_application_ttl_days() -> u32 {
    90
}
