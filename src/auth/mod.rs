//! Authorization system
//!
//! The decision surface for every protected operation: the policy
//! model, the cached permission resolver, and the authorization guard,
//! composed behind the [`AccessControl`] facade.

pub mod rbac;

pub use rbac::{
    CacheStats, Permission, PermissionAction, PermissionCache, PermissionResolver, PolicyModel,
    Resource, Role, RoleConstraintViolation,
};

use crate::core::models::{AuditLogEntry, AuditOutcome};
use crate::storage::{AuditSink, IdentityStore};
use crate::utils::error::{PlatformError, Result};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// Why an authorization request was denied
///
/// The public message is deliberately opaque; the variant itself is for
/// logs and the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// No effective permission matched the requested (resource, action)
    InsufficientPermission,
    /// A caller role is not part of the policy — treated as a security
    /// anomaly, never silently ignored
    UnrecognizedRole,
}

impl DenialReason {
    /// User-facing message; must not leak which permission or role
    /// would have succeeded
    pub fn public_message(&self) -> &'static str {
        "insufficient permission"
    }

    fn detail(&self) -> &'static str {
        match self {
            Self::InsufficientPermission => "no matching permission",
            Self::UnrecognizedRole => "invalid role detected",
        }
    }
}

/// Outcome of an authorization check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// The operation may proceed
    Allow,
    /// The operation is denied
    Deny {
        /// Reason for the denial
        reason: DenialReason,
    },
}

impl AccessDecision {
    /// Whether the decision allows the operation
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Authorization facade: guard, resolver, cache, and audit in one place
pub struct AccessControl {
    policy: Arc<PolicyModel>,
    resolver: PermissionResolver,
    cache: Arc<PermissionCache>,
    identity: Arc<dyn IdentityStore>,
    audit: Arc<dyn AuditSink>,
}

impl AccessControl {
    /// Wire the facade over a policy model, cache, identity store, and
    /// audit sink
    pub fn new(
        policy: Arc<PolicyModel>,
        cache: Arc<PermissionCache>,
        identity: Arc<dyn IdentityStore>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let resolver = PermissionResolver::new(Arc::clone(&policy), Arc::clone(&cache));
        Self {
            policy,
            resolver,
            cache,
            identity,
            audit,
        }
    }

    /// Decide whether a caller may perform `action` on `resource`
    ///
    /// Hot path: in-memory throughout; the only cost beyond the cache
    /// lookup is the cache-miss permission computation. The audit
    /// append is best-effort and never changes the decision.
    pub async fn authorize(
        &self,
        user_id: &str,
        roles: &[Role],
        custom_permissions: &[Permission],
        resource: Resource,
        action: PermissionAction,
    ) -> Result<AccessDecision> {
        if let Some(unknown) = roles.iter().find(|role| !self.policy.is_defined(**role)) {
            warn!(user_id, role = %unknown, "authorization request with unrecognized role");
            let decision = AccessDecision::Deny {
                reason: DenialReason::UnrecognizedRole,
            };
            self.record_decision(user_id, roles, resource, action, &decision)
                .await;
            return Ok(decision);
        }

        let effective = self.resolver.resolve(user_id, roles, custom_permissions)?;
        let decision = if effective.iter().any(|p| p.grants(resource, action)) {
            AccessDecision::Allow
        } else {
            AccessDecision::Deny {
                reason: DenialReason::InsufficientPermission,
            }
        };

        debug!(
            user_id,
            resource = %resource,
            action = %action,
            allowed = decision.is_allowed(),
            "authorization decision"
        );
        self.record_decision(user_id, roles, resource, action, &decision)
            .await;
        Ok(decision)
    }

    /// Authorize by user id, loading roles and grants from the
    /// identity store
    ///
    /// Suspended and unverified accounts are denied outright.
    pub async fn authorize_user(
        &self,
        user_id: &str,
        resource: Resource,
        action: PermissionAction,
    ) -> Result<AccessDecision> {
        let user = self
            .identity
            .get_user(user_id)
            .await?
            .ok_or_else(|| PlatformError::not_found(format!("user {user_id} not found")))?;

        if !user.is_active() {
            let decision = AccessDecision::Deny {
                reason: DenialReason::InsufficientPermission,
            };
            self.record_decision(user_id, &user.roles, resource, action, &decision)
                .await;
            return Ok(decision);
        }

        self.authorize(
            user_id,
            &user.roles,
            &user.custom_permissions,
            resource,
            action,
        )
        .await
    }

    /// Add a custom permission grant to a user
    ///
    /// The cache entry is invalidated unconditionally after the write
    /// attempt: a store write that succeeded but whose result we failed
    /// to observe must not leave a stale authorization set behind.
    pub async fn grant_custom_permission(
        &self,
        user_id: &str,
        permission: Permission,
    ) -> Result<()> {
        let user = self
            .identity
            .get_user(user_id)
            .await?
            .ok_or_else(|| PlatformError::not_found(format!("user {user_id} not found")))?;

        self.policy.validate_permission(&permission)?;
        if user.custom_permissions.contains(&permission) {
            return Ok(());
        }

        let mut updated = user.custom_permissions.clone();
        updated.push(permission.clone());
        self.policy.validate_custom_permissions(&updated)?;

        let result = self
            .identity
            .update_custom_permissions(user_id, updated, user.version)
            .await;
        self.cache.invalidate(user_id);
        result?;

        self.append_audit(
            AuditLogEntry::new(
                user_id,
                "permission.grant",
                permission.resource.as_str(),
                user.roles,
                AuditOutcome::Success,
            )
            .with_metadata(json!({ "permission": permission })),
        )
        .await;
        Ok(())
    }

    /// Remove a custom permission grant from a user
    pub async fn revoke_custom_permission(
        &self,
        user_id: &str,
        permission: &Permission,
    ) -> Result<()> {
        let user = self
            .identity
            .get_user(user_id)
            .await?
            .ok_or_else(|| PlatformError::not_found(format!("user {user_id} not found")))?;

        if !user.custom_permissions.contains(permission) {
            return Ok(());
        }

        let updated: Vec<Permission> = user
            .custom_permissions
            .iter()
            .filter(|p| *p != permission)
            .cloned()
            .collect();

        let result = self
            .identity
            .update_custom_permissions(user_id, updated, user.version)
            .await;
        self.cache.invalidate(user_id);
        result?;

        self.append_audit(
            AuditLogEntry::new(
                user_id,
                "permission.revoke",
                permission.resource.as_str(),
                user.roles,
                AuditOutcome::Success,
            )
            .with_metadata(json!({ "permission": permission })),
        )
        .await;
        Ok(())
    }

    /// The policy model behind this facade
    pub fn policy(&self) -> &PolicyModel {
        &self.policy
    }

    /// The permission cache behind this facade
    pub fn cache(&self) -> &PermissionCache {
        &self.cache
    }

    /// The permission resolver behind this facade
    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    async fn record_decision(
        &self,
        user_id: &str,
        roles: &[Role],
        resource: Resource,
        action: PermissionAction,
        decision: &AccessDecision,
    ) {
        let (outcome, reason) = match decision {
            AccessDecision::Allow => (AuditOutcome::Success, None),
            AccessDecision::Deny { reason } => (AuditOutcome::Failure, Some(reason.detail())),
        };

        self.append_audit(
            AuditLogEntry::new(user_id, "authorize", resource.as_str(), roles.to_vec(), outcome)
                .with_metadata(json!({ "action": action, "reason": reason })),
        )
        .await;
    }

    async fn append_audit(&self, entry: AuditLogEntry) {
        if let Err(error) = self.audit.append(entry).await {
            warn!(%error, "audit append failed");
        }
    }
}
