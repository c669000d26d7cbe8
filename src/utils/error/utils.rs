use super::error::PlatformError;

/// Coarse error classification used by callers deciding whether to
/// retry, surface, or swallow a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller/config error, surfaced verbatim, never retried
    PolicyViolation,
    /// User-recoverable by taking a different action
    UserRecoverable,
    /// Eligible for a bounded retry
    Transient,
    /// Logged, never propagated as the operation's outcome
    NonFatal,
    /// Infrastructure or programming fault
    System,
}

impl ErrorCategory {
    /// Classify a platform error
    pub fn of(error: &PlatformError) -> Self {
        match error {
            PlatformError::Policy(_) => Self::PolicyViolation,
            PlatformError::StateConflict(_)
            | PlatformError::Validation(_)
            | PlatformError::NotFound(_) => Self::UserRecoverable,
            PlatformError::TransactionConflict(_) | PlatformError::StoreUnavailable(_) => {
                Self::Transient
            }
            PlatformError::Notification(_) | PlatformError::Audit(_) => Self::NonFatal,
            _ => Self::System,
        }
    }
}
