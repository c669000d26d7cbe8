//! Utility modules for the platform core
//!
//! - **error**: error taxonomy and classification helpers

pub mod error;

pub use error::{ErrorCategory, PlatformError, Result};
