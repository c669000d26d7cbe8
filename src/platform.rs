//! Platform facade
//!
//! Single construction path wiring configuration, storage, the policy
//! model, the permission cache (with its background sweeper), access
//! control, and the application manager.

use crate::auth::rbac::{spawn_sweeper, PermissionCache, PolicyModel};
use crate::auth::AccessControl;
use crate::config::Config;
use crate::core::applications::ApplicationManager;
use crate::services::{LoggingNotifier, Notifier};
use crate::storage::{ApplicationStore, AuditSink, BlobStore, IdentityStore, StorageLayer};
use crate::utils::error::Result;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Result of one maintenance pass
#[derive(Debug, Clone, Copy, Default)]
pub struct MaintenanceReport {
    /// Open applications moved to expired
    pub expired_applications: usize,
    /// Audit entries dropped by the retention purge
    pub purged_audit_entries: usize,
    /// Permission cache entries swept
    pub swept_cache_entries: usize,
}

/// The assembled authorization and role-application engine
pub struct Platform {
    config: Config,
    storage: StorageLayer,
    policy: Arc<PolicyModel>,
    cache: Arc<PermissionCache>,
    access: Arc<AccessControl>,
    applications: Arc<ApplicationManager>,
    sweeper: Option<JoinHandle<()>>,
}

impl Platform {
    /// Build the engine over in-memory storage
    pub async fn new(config: Config) -> Result<Self> {
        Self::with_notifier(config, Arc::new(LoggingNotifier::new())).await
    }

    /// Build the engine with a custom notification backend
    pub async fn with_notifier(config: Config, notifier: Arc<dyn Notifier>) -> Result<Self> {
        info!("initializing platform core");
        config.check()?;

        let storage = StorageLayer::in_memory();
        let policy = Arc::new(PolicyModel::new(config.access.policy_version.clone())?);
        let cache = Arc::new(PermissionCache::new(
            config.access.cache.ttl(),
            config.access.cache.max_entries,
        ));

        let sweeper = config
            .access
            .cache
            .sweep_interval()
            .map(|interval| spawn_sweeper(Arc::clone(&cache), interval));

        let access = Arc::new(AccessControl::new(
            Arc::clone(&policy),
            Arc::clone(&cache),
            Arc::clone(&storage.store) as Arc<dyn IdentityStore>,
            Arc::clone(&storage.audit) as Arc<dyn AuditSink>,
        ));

        let applications = Arc::new(ApplicationManager::new(
            Arc::clone(&storage.store) as Arc<dyn ApplicationStore>,
            Arc::clone(&storage.store) as Arc<dyn IdentityStore>,
            Arc::clone(&storage.blobs) as Arc<dyn BlobStore>,
            Arc::clone(&policy),
            Arc::clone(&cache),
            notifier,
            Arc::clone(&storage.audit) as Arc<dyn AuditSink>,
            config.applications.clone(),
        ));

        info!("platform core initialized");
        Ok(Self {
            config,
            storage,
            policy,
            cache,
            access,
            applications,
            sweeper,
        })
    }

    /// Run one maintenance pass: expire stale applications, purge old
    /// audit entries, sweep the permission cache
    pub async fn run_maintenance(&self) -> Result<MaintenanceReport> {
        let expired_applications = self.applications.expire_stale().await?;

        let purged_audit_entries = if self.config.audit.enabled {
            let cutoff = Utc::now() - Duration::days(i64::from(self.config.audit.retention_days));
            self.storage.audit.purge_older_than(cutoff).await?
        } else {
            0
        };

        let swept_cache_entries = self.cache.sweep_expired();

        Ok(MaintenanceReport {
            expired_applications,
            purged_audit_entries,
            swept_cache_entries,
        })
    }

    /// Stop background tasks
    pub fn shutdown(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
            info!("cache sweeper stopped");
        }
    }

    /// The engine configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The storage layer
    pub fn storage(&self) -> &StorageLayer {
        &self.storage
    }

    /// The policy model
    pub fn policy(&self) -> &PolicyModel {
        &self.policy
    }

    /// The permission cache
    pub fn cache(&self) -> &PermissionCache {
        &self.cache
    }

    /// The authorization facade
    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    /// The role-application manager
    pub fn applications(&self) -> &ApplicationManager {
        &self.applications
    }
}

impl Drop for Platform {
    fn drop(&mut self) {
        self.shutdown();
    }
}
