//! Configuration management
//!
//! Loading and validation of the engine configuration.

pub mod models;
pub mod validation;

pub use models::*;
pub use validation::Validate;

use crate::utils::error::{PlatformError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Top-level configuration for the engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Access control configuration
    #[serde(default)]
    pub access: AccessConfig,
    /// Role-application workflow configuration
    #[serde(default)]
    pub applications: ApplicationsConfig,
    /// Audit trail configuration
    #[serde(default)]
    pub audit: AuditConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("loading configuration from {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PlatformError::config(format!("failed to read config file: {e}")))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| PlatformError::config(format!("failed to parse config: {e}")))?;
        config.check()?;

        debug!("configuration loaded successfully");
        Ok(config)
    }

    /// Validate the full configuration tree
    pub fn check(&self) -> Result<()> {
        self.access
            .validate()
            .and_then(|_| self.applications.validate())
            .and_then(|_| self.audit.validate())
            .map_err(PlatformError::config)
    }
}
