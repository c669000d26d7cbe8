//! Permission cache
//!
//! Time-bounded memoization of resolved permission sets, keyed by user
//! identity. An entry is only served while its role snapshot matches the
//! user's current roles, its policy version matches, and its age is
//! below the TTL. The cache is an explicitly constructed, injectable
//! instance; role or custom-permission writers must call
//! [`PermissionCache::invalidate`] as part of the same logical
//! operation as the underlying persistent write.

use super::types::{Permission, Role};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// A resolved permission set with the context it was computed under
#[derive(Debug, Clone)]
pub struct CachedPermissions {
    /// The resolved permission set
    pub permissions: HashSet<Permission>,
    /// Roles the set was computed from
    pub roles_snapshot: Vec<Role>,
    /// When the set was computed
    pub computed_at: Instant,
    /// Policy version the set was computed under
    pub policy_version: String,
}

impl CachedPermissions {
    /// Whether the entry has outlived the TTL
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.computed_at.elapsed() > ttl
    }

    /// Whether the entry still describes the caller's current context
    ///
    /// Role comparison is order-sensitive; role sets are small and
    /// assigned in canonical order.
    pub fn matches(&self, roles: &[Role], policy_version: &str) -> bool {
        self.roles_snapshot == roles && self.policy_version == policy_version
    }
}

/// Lock-free cache statistics for hot path updates
#[derive(Debug, Default)]
pub struct AtomicCacheStats {
    /// Cache hits
    pub hits: AtomicU64,
    /// Cache misses (absent, stale, or mismatched entries)
    pub misses: AtomicU64,
    /// Explicit invalidations
    pub invalidations: AtomicU64,
    /// Entries removed by expiry sweeps
    pub evictions: AtomicU64,
}

impl AtomicCacheStats {
    /// Create a snapshot of current stats
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Reset all stats to zero
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.invalidations.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
    }
}

/// Cache statistics snapshot (returned to callers)
#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    /// Cache hits
    pub hits: u64,
    /// Cache misses
    pub misses: u64,
    /// Explicit invalidations
    pub invalidations: u64,
    /// Entries removed by expiry sweeps
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Shared, in-memory permission cache keyed by user identity
pub struct PermissionCache {
    entries: DashMap<String, CachedPermissions>,
    ttl: Duration,
    max_entries: usize,
    stats: AtomicCacheStats,
}

impl PermissionCache {
    /// Create a new cache with the given TTL and capacity bound
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries,
            stats: AtomicCacheStats::default(),
        }
    }

    /// Look up a user's cached permission set
    ///
    /// Returns the set only if the stored snapshot matches the caller's
    /// current roles and policy version and the entry is within TTL.
    /// Stale or mismatched entries are dropped on the way out.
    pub fn get(
        &self,
        user_id: &str,
        roles: &[Role],
        policy_version: &str,
    ) -> Option<HashSet<Permission>> {
        if let Some(entry) = self.entries.get(user_id) {
            if !entry.is_expired(self.ttl) && entry.matches(roles, policy_version) {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                debug!(user_id, "permission cache hit");
                return Some(entry.permissions.clone());
            }
        }

        // Drop a stale or mismatched entry so it cannot be served later
        self.entries
            .remove_if(user_id, |_, entry| {
                entry.is_expired(self.ttl) || !entry.matches(roles, policy_version)
            });
        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        debug!(user_id, "permission cache miss");
        None
    }

    /// Store a freshly resolved permission set
    pub fn insert(
        &self,
        user_id: impl Into<String>,
        roles: Vec<Role>,
        permissions: HashSet<Permission>,
        policy_version: impl Into<String>,
    ) {
        if self.entries.len() >= self.max_entries {
            self.sweep_expired();
        }

        self.entries.insert(
            user_id.into(),
            CachedPermissions {
                permissions,
                roles_snapshot: roles,
                computed_at: Instant::now(),
                policy_version: policy_version.into(),
            },
        );
    }

    /// Remove a user's entry after a role or permission mutation
    pub fn invalidate(&self, user_id: &str) {
        if self.entries.remove(user_id).is_some() {
            self.stats.invalidations.fetch_add(1, Ordering::Relaxed);
            debug!(user_id, "permission cache invalidated");
        }
    }

    /// Drop every entry (policy reload)
    pub fn clear(&self) {
        self.entries.clear();
        info!("permission cache cleared");
    }

    /// Remove expired entries, returning how many were dropped
    pub fn sweep_expired(&self) -> usize {
        let mut removed = 0usize;
        self.entries.retain(|_, entry| {
            if entry.is_expired(self.ttl) {
                removed += 1;
                false
            } else {
                true
            }
        });

        if removed > 0 {
            self.stats
                .evictions
                .fetch_add(removed as u64, Ordering::Relaxed);
            debug!(removed, "swept expired permission cache entries");
        }
        removed
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get cache statistics (lock-free snapshot)
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }
}

/// Spawn the low-frequency expiry sweep task
///
/// Periodic and independent of request handling; abort the handle on
/// shutdown.
pub fn spawn_sweeper(cache: Arc<PermissionCache>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            cache.sweep_expired();
        }
    })
}
