//! Audit trail configuration

use crate::config::validation::Validate;
use serde::{Deserialize, Serialize};

/// Audit trail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Enable the audit trail
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Days entries are retained before the purge sweep drops them
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            retention_days: default_retention_days(),
        }
    }
}

impl Validate for AuditConfig {
    fn validate(&self) -> Result<(), String> {
        if self.enabled && self.retention_days == 0 {
            return Err("audit retention must be at least one day".to_string());
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_retention_days() -> u32 {
    180
}
