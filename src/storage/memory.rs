//! In-memory store
//!
//! Reference implementation of the identity and application stores.
//! All state sits behind a single `RwLock`, so commits are serializable
//! by construction: a transaction validates every version check under
//! the write lock before applying any write, which makes partial
//! application impossible.

use super::traits::{ApplicationStore, ApplicationTxn, ApplicationWrite, IdentityStore, UserWrite};
use crate::auth::rbac::{Permission, Role};
use crate::core::models::{RoleApplication, RoleData, User};
use crate::utils::error::{PlatformError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

#[derive(Default)]
struct MemoryState {
    users: HashMap<String, User>,
    applications: HashMap<String, RoleApplication>,
}

/// In-memory identity + application store
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn conflict(what: &str, id: &str) -> PlatformError {
        PlatformError::transaction_conflict(format!("{what} {id} was modified concurrently"))
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.state.read().users.get(user_id).cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut state = self.state.write();
        if state.users.contains_key(&user.user_id) {
            return Err(PlatformError::state_conflict(format!(
                "user {} already exists",
                user.user_id
            )));
        }
        state.users.insert(user.user_id.clone(), user.clone());
        Ok(())
    }

    async fn update_user_roles(
        &self,
        user_id: &str,
        roles: Vec<Role>,
        expected_version: u64,
    ) -> Result<()> {
        let mut state = self.state.write();
        let user = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| PlatformError::not_found(format!("user {user_id} not found")))?;

        if user.version != expected_version {
            return Err(Self::conflict("user", user_id));
        }
        user.roles = roles;
        user.version += 1;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn set_role_verified(
        &self,
        user_id: &str,
        role: Role,
        verified_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.state.write();
        let user = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| PlatformError::not_found(format!("user {user_id} not found")))?;

        user.role_data.insert(
            role,
            RoleData {
                verified: true,
                verified_at: Some(verified_at),
            },
        );
        user.version += 1;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn update_custom_permissions(
        &self,
        user_id: &str,
        permissions: Vec<Permission>,
        expected_version: u64,
    ) -> Result<()> {
        let mut state = self.state.write();
        let user = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| PlatformError::not_found(format!("user {user_id} not found")))?;

        if user.version != expected_version {
            return Err(Self::conflict("user", user_id));
        }
        user.custom_permissions = permissions;
        user.version += 1;
        user.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn get_application(&self, application_id: &str) -> Result<Option<RoleApplication>> {
        Ok(self.state.read().applications.get(application_id).cloned())
    }

    async fn find_open_for_user(&self, user_id: &str) -> Result<Option<RoleApplication>> {
        Ok(self
            .state
            .read()
            .applications
            .values()
            .find(|app| app.user_id == user_id && app.status.is_open())
            .cloned())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<RoleApplication>> {
        let mut applications: Vec<RoleApplication> = self
            .state
            .read()
            .applications
            .values()
            .filter(|app| app.user_id == user_id)
            .cloned()
            .collect();
        applications.sort_by_key(|app| app.created_at);
        Ok(applications)
    }

    async fn list_open_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<RoleApplication>> {
        Ok(self
            .state
            .read()
            .applications
            .values()
            .filter(|app| app.status.is_open() && app.created_at < cutoff)
            .cloned()
            .collect())
    }

    async fn commit(&self, txn: ApplicationTxn) -> Result<()> {
        let mut state = self.state.write();

        // Validate every precondition before touching anything.
        match &txn.application {
            ApplicationWrite::Insert(application) => {
                if state.applications.contains_key(&application.id) {
                    return Err(Self::conflict("application", &application.id));
                }
                // Single-open-application invariant, enforced here the
                // way a unique partial index would.
                if application.status.is_open() {
                    let open_exists = state
                        .applications
                        .values()
                        .any(|a| a.user_id == application.user_id && a.status.is_open());
                    if open_exists {
                        return Err(PlatformError::transaction_conflict(format!(
                            "user {} already has an open application",
                            application.user_id
                        )));
                    }
                }
            }
            ApplicationWrite::Update {
                application,
                expected_version,
            } => {
                let current = state.applications.get(&application.id).ok_or_else(|| {
                    PlatformError::not_found(format!("application {} not found", application.id))
                })?;
                if current.version != *expected_version {
                    return Err(Self::conflict("application", &application.id));
                }
            }
            ApplicationWrite::Delete {
                application_id,
                expected_version,
            } => {
                let current = state.applications.get(application_id).ok_or_else(|| {
                    PlatformError::not_found(format!("application {application_id} not found"))
                })?;
                if current.version != *expected_version {
                    return Err(Self::conflict("application", application_id));
                }
            }
        }

        if let Some(user_write) = &txn.user {
            let user = state.users.get(&user_write.user_id).ok_or_else(|| {
                PlatformError::not_found(format!("user {} not found", user_write.user_id))
            })?;
            if user.version != user_write.expected_version {
                return Err(Self::conflict("user", &user_write.user_id));
            }
        }

        // All checks passed; apply everything.
        let now = Utc::now();
        match txn.application {
            ApplicationWrite::Insert(application) => {
                debug!(application_id = %application.id, "committing application insert");
                state
                    .applications
                    .insert(application.id.clone(), application);
            }
            ApplicationWrite::Update {
                mut application, ..
            } => {
                debug!(application_id = %application.id, "committing application update");
                application.version += 1;
                state
                    .applications
                    .insert(application.id.clone(), application);
            }
            ApplicationWrite::Delete { application_id, .. } => {
                debug!(%application_id, "committing application delete");
                state.applications.remove(&application_id);
            }
        }

        if let Some(UserWrite {
            user_id,
            roles,
            verified_role,
            ..
        }) = txn.user
        {
            let user = state
                .users
                .get_mut(&user_id)
                .expect("user existence checked above");
            if let Some(roles) = roles {
                user.roles = roles;
            }
            if let Some((role, verified_at)) = verified_role {
                user.role_data.insert(
                    role,
                    RoleData {
                        verified: true,
                        verified_at: Some(verified_at),
                    },
                );
            }
            user.version += 1;
            user.updated_at = now;
        }

        Ok(())
    }
}
