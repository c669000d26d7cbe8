//! Error handling for the platform core
//!
//! This module defines all error types used throughout the engine.

use thiserror::Error;

/// Result type alias for the platform core
pub type Result<T> = std::result::Result<T, PlatformError>;

/// Main error type for the platform core
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Policy violations (invalid role/permission, circular inheritance,
    /// disallowed role combination)
    #[error("Policy violation: {0}")]
    Policy(String),

    /// State conflicts (duplicate open application, operation not valid
    /// in the application's current state)
    #[error("State conflict: {0}")]
    StateConflict(String),

    /// Validation errors (missing required fields/documents, malformed
    /// field payloads)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Optimistic-concurrency conflicts during a store commit
    #[error("Transaction conflict: {0}")]
    TransactionConflict(String),

    /// Store unavailable or failing at the infrastructure level
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Notification dispatch failures (logged, never fatal)
    #[error("Notification error: {0}")]
    Notification(String),

    /// Audit sink failures (logged, never fatal)
    #[error("Audit error: {0}")]
    Audit(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Helper functions for creating specific errors
impl PlatformError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn policy<S: Into<String>>(message: S) -> Self {
        Self::Policy(message.into())
    }

    pub fn state_conflict<S: Into<String>>(message: S) -> Self {
        Self::StateConflict(message.into())
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    pub fn transaction_conflict<S: Into<String>>(message: S) -> Self {
        Self::TransactionConflict(message.into())
    }

    pub fn store_unavailable<S: Into<String>>(message: S) -> Self {
        Self::StoreUnavailable(message.into())
    }

    pub fn notification<S: Into<String>>(message: S) -> Self {
        Self::Notification(message.into())
    }

    pub fn audit<S: Into<String>>(message: S) -> Self {
        Self::Audit(message.into())
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }
}

impl PlatformError {
    /// Whether a bounded retry by the caller may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::TransactionConflict(_) | Self::StoreUnavailable(_)
        )
    }

    /// Whether the error is recoverable by the caller fixing the request
    /// (as opposed to an infrastructure or programming fault)
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Policy(_) | Self::StateConflict(_) | Self::Validation(_) | Self::NotFound(_)
        )
    }

    /// Whether the error must never abort the operation that triggered it
    pub fn is_non_fatal(&self) -> bool {
        matches!(self, Self::Notification(_) | Self::Audit(_))
    }
}
