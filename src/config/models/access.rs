//! Access control configuration

use crate::config::validation::Validate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Permission cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionCacheConfig {
    /// Entry time-to-live in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
    /// Maximum number of cached permission sets
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,
    /// Interval of the background expiry sweep in seconds; 0 disables
    /// the sweeper task
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl PermissionCacheConfig {
    /// TTL as a duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Sweep interval as a duration, if the sweeper is enabled
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }
}

impl Default for PermissionCacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
            max_entries: default_cache_max_entries(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Validate for PermissionCacheConfig {
    fn validate(&self) -> Result<(), String> {
        if self.ttl_secs == 0 {
            return Err("permission cache TTL must be greater than zero".to_string());
        }
        if self.max_entries == 0 {
            return Err("permission cache capacity must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Access control configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Permission cache configuration
    #[serde(default)]
    pub cache: PermissionCacheConfig,
    /// Policy version stamped into cached permission sets
    #[serde(default = "default_policy_version")]
    pub policy_version: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            cache: PermissionCacheConfig::default(),
            policy_version: default_policy_version(),
        }
    }
}

impl Validate for AccessConfig {
    fn validate(&self) -> Result<(), String> {
        self.cache.validate()?;
        if self.policy_version.trim().is_empty() {
            return Err("policy version must not be empty".to_string());
        }
        Ok(())
    }
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_cache_max_entries() -> usize {
    10_000
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_policy_version() -> String {
    "v1".to_string()
}
