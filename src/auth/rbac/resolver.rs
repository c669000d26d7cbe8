//! Permission resolver
//!
//! Computes the effective permission set for a user: the union of every
//! held role's permissions (inherited included) plus the user's custom
//! grants, de-duplicated by identity. Results are memoized through the
//! [`PermissionCache`]; resolution is entirely in-memory.

use super::cache::PermissionCache;
use super::policy::PolicyModel;
use super::types::{Permission, Role};
use crate::utils::error::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Resolves effective permissions against the policy model, with
/// cache-backed memoization
pub struct PermissionResolver {
    policy: Arc<PolicyModel>,
    cache: Arc<PermissionCache>,
}

impl PermissionResolver {
    /// Create a resolver over a policy model and cache instance
    pub fn new(policy: Arc<PolicyModel>, cache: Arc<PermissionCache>) -> Self {
        Self { policy, cache }
    }

    /// Resolve a user's effective permission set
    ///
    /// Propagates policy errors for unknown roles or malformed custom
    /// permissions; an unresolvable role is never silently dropped.
    pub fn resolve(
        &self,
        user_id: &str,
        roles: &[Role],
        custom_permissions: &[Permission],
    ) -> Result<HashSet<Permission>> {
        if let Some(cached) = self.cache.get(user_id, roles, self.policy.version()) {
            return Ok(cached);
        }

        self.policy.validate_custom_permissions(custom_permissions)?;

        let mut effective = HashSet::new();
        for role in roles {
            effective.extend(self.policy.role_permissions(*role)?);
        }
        effective.extend(custom_permissions.iter().cloned());

        debug!(
            user_id,
            permissions = effective.len(),
            "resolved effective permissions"
        );
        self.cache.insert(
            user_id,
            roles.to_vec(),
            effective.clone(),
            self.policy.version(),
        );
        Ok(effective)
    }

    /// The policy model this resolver computes against
    pub fn policy(&self) -> &PolicyModel {
        &self.policy
    }

    /// The cache backing this resolver
    pub fn cache(&self) -> &PermissionCache {
        &self.cache
    }
}
