//! Error taxonomy integration tests
//!
//! Verify that failures flowing out of the engine carry the right
//! class, so callers can tell "try again" from "fix your request".

use crate::common::{ApplicationFactory, TestPlatform, UserFactory};
use rolegate::utils::error::ErrorCategory;
use rolegate::{PlatformError, Role, StepOutcome, StepUpdate};
use serde_json::json;

#[tokio::test]
async fn test_duplicate_application_is_user_recoverable() {
    let t = TestPlatform::new().await;
    let user = t.seed_base_user().await;

    t.platform
        .applications()
        .submit(ApplicationFactory::mentor(&user.user_id))
        .await
        .unwrap();
    let err = t
        .platform
        .applications()
        .submit(ApplicationFactory::mentor(&user.user_id))
        .await
        .unwrap_err();

    assert!(err.is_user_error());
    assert!(!err.is_transient());
    assert_eq!(ErrorCategory::of(&err), ErrorCategory::UserRecoverable);
}

#[tokio::test]
async fn test_disallowed_combination_is_a_policy_violation() {
    let t = TestPlatform::new().await;
    let mentor = UserFactory::with_roles(vec![Role::User, Role::Mentor]);
    t.seed_user(&mentor).await;

    let err = t
        .platform
        .applications()
        .submit(ApplicationFactory::student(&mentor.user_id))
        .await
        .unwrap_err();

    assert_eq!(ErrorCategory::of(&err), ErrorCategory::PolicyViolation);
    // Policy violations surface verbatim
    assert!(err.to_string().contains("mutually exclusive"));
}

#[tokio::test]
async fn test_malformed_fields_are_fix_and_resubmit() {
    let t = TestPlatform::new().await;
    let user = t.seed_base_user().await;

    let mut request = ApplicationFactory::seller(&user.user_id);
    request.fields = json!({ "businessType": "llc" });

    let err = t.platform.applications().submit(request).await.unwrap_err();
    assert!(matches!(err, PlatformError::Validation(_)));
    assert_eq!(ErrorCategory::of(&err), ErrorCategory::UserRecoverable);
    assert!(err.to_string().contains("storeName"));
}

#[tokio::test]
async fn test_unknown_application_is_not_found() {
    let t = TestPlatform::new().await;

    let err = t
        .platform
        .applications()
        .update_verification_step(StepUpdate {
            application_id: "missing".into(),
            step: "document_review".into(),
            outcome: StepOutcome::Completed,
            actor: "reviewer-1".into(),
            notes: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, PlatformError::NotFound(_)));
    assert!(err.is_user_error());
}

#[test]
fn test_transient_class_is_retryable() {
    let conflict = PlatformError::transaction_conflict("version mismatch");
    assert!(conflict.is_transient());
    assert_eq!(ErrorCategory::of(&conflict), ErrorCategory::Transient);

    let unavailable = PlatformError::store_unavailable("connection reset");
    assert!(unavailable.is_transient());
}

#[test]
fn test_non_fatal_class_never_propagates_as_outcome() {
    for error in [
        PlatformError::notification("smtp unreachable"),
        PlatformError::audit("sink full"),
    ] {
        assert!(error.is_non_fatal());
        assert!(!error.is_user_error());
        assert_eq!(ErrorCategory::of(&error), ErrorCategory::NonFatal);
    }
}
