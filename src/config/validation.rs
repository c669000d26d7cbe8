//! Configuration validation

/// Validation hook implemented by every configuration model
pub trait Validate {
    /// Check the configuration, returning a descriptive message on the
    /// first violation
    fn validate(&self) -> Result<(), String>;
}
