//! Custom assertions for error taxonomy checks

use rolegate::PlatformError;

/// Assert an error is a user-facing state conflict
pub fn assert_state_conflict(error: &PlatformError) {
    assert!(
        matches!(error, PlatformError::StateConflict(_)),
        "expected StateConflict, got: {error}"
    );
}

/// Assert an error is a fix-and-resubmit validation failure
pub fn assert_validation(error: &PlatformError) {
    assert!(
        matches!(error, PlatformError::Validation(_)),
        "expected Validation, got: {error}"
    );
}

/// Assert an error is a policy violation
pub fn assert_policy(error: &PlatformError) {
    assert!(
        matches!(error, PlatformError::Policy(_)),
        "expected Policy, got: {error}"
    );
}

/// Assert an error message mentions a fragment
pub fn assert_mentions(error: &PlatformError, fragment: &str) {
    let message = error.to_string();
    assert!(
        message.contains(fragment),
        "expected error to mention `{fragment}`, got: {message}"
    );
}
