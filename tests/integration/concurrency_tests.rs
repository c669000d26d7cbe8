//! Concurrent transition tests
//!
//! The store serializes commits and every transition re-validates after
//! a conflict, so racing operations end with exactly one winner and a
//! consistent stored state.

use crate::common::{ApplicationFactory, TestPlatform};
use rolegate::storage::{ApplicationStore, IdentityStore};
use rolegate::{ApplicationStatus, PlatformError, Role, StepOutcome, StepUpdate};

async fn writer_in_final_step(t: &TestPlatform, user_id: &str) -> String {
    let application = t
        .platform
        .applications()
        .submit(ApplicationFactory::writer(user_id))
        .await
        .unwrap();

    t.platform
        .applications()
        .update_verification_step(StepUpdate {
            application_id: application.id.clone(),
            step: "document_review".into(),
            outcome: StepOutcome::Completed,
            actor: "reviewer-1".into(),
            notes: None,
        })
        .await
        .unwrap();

    application.id
}

#[tokio::test]
async fn test_final_step_vs_withdraw_has_exactly_one_winner() {
    let t = TestPlatform::new().await;
    let user = t.seed_base_user().await;
    let application_id = writer_in_final_step(&t, &user.user_id).await;

    let (step_result, withdraw_result) = tokio::join!(
        t.platform.applications().update_verification_step(StepUpdate {
            application_id: application_id.clone(),
            step: "sample_review".into(),
            outcome: StepOutcome::Completed,
            actor: "reviewer-1".into(),
            notes: None,
        }),
        t.platform.applications().withdraw(&application_id, &user.user_id),
    );

    let winners = usize::from(step_result.is_ok()) + usize::from(withdraw_result.is_ok());
    assert_eq!(winners, 1, "exactly one of the racing operations must win");

    let stored_user = t
        .platform
        .storage()
        .store
        .get_user(&user.user_id)
        .await
        .unwrap()
        .unwrap();
    let stored_application = t
        .platform
        .applications()
        .get(&application_id)
        .await
        .unwrap();

    if step_result.is_ok() {
        // Approval won: the application is terminal and the role is
        // granted; the withdrawal failed cleanly.
        let application = stored_application.expect("application must remain");
        assert_eq!(application.status, ApplicationStatus::Approved);
        assert!(stored_user.has_role(Role::Writer));

        let err = withdraw_result.unwrap_err();
        assert!(
            matches!(err, PlatformError::StateConflict(_)),
            "withdraw loser must see a state conflict, got: {err}"
        );
    } else {
        // Withdrawal won: the application is gone and no role changed;
        // the step update failed cleanly.
        assert!(stored_application.is_none());
        assert_eq!(stored_user.roles, vec![Role::User]);

        let err = step_result.unwrap_err();
        assert!(
            matches!(
                err,
                PlatformError::StateConflict(_) | PlatformError::NotFound(_)
            ),
            "step-update loser must fail cleanly, got: {err}"
        );
    }
}

#[tokio::test]
async fn test_concurrent_submissions_leave_one_open_application() {
    let t = TestPlatform::new().await;
    let user = t.seed_base_user().await;

    let (first, second) = tokio::join!(
        t.platform
            .applications()
            .submit(ApplicationFactory::mentor(&user.user_id)),
        t.platform
            .applications()
            .submit(ApplicationFactory::writer(&user.user_id)),
    );

    let winners = usize::from(first.is_ok()) + usize::from(second.is_ok());
    assert_eq!(winners, 1, "only one submission may create an application");

    let open = t
        .platform
        .storage()
        .store
        .find_open_for_user(&user.user_id)
        .await
        .unwrap();
    assert!(open.is_some());

    let loser = if first.is_ok() { second } else { first };
    assert!(matches!(
        loser.unwrap_err(),
        PlatformError::StateConflict(_)
    ));
}

#[tokio::test]
async fn test_concurrent_step_updates_on_different_steps_both_land() {
    let t = TestPlatform::new().await;
    let user = t.seed_base_user().await;
    let application = t
        .platform
        .applications()
        .submit(ApplicationFactory::seller(&user.user_id))
        .await
        .unwrap();

    // Distinct steps: the conflicting commit retries against the fresh
    // version and both resolutions land.
    let (first, second) = tokio::join!(
        t.platform.applications().update_verification_step(StepUpdate {
            application_id: application.id.clone(),
            step: "document_review".into(),
            outcome: StepOutcome::Completed,
            actor: "reviewer-1".into(),
            notes: None,
        }),
        t.platform.applications().update_verification_step(StepUpdate {
            application_id: application.id.clone(),
            step: "business_verification".into(),
            outcome: StepOutcome::Completed,
            actor: "reviewer-2".into(),
            notes: None,
        }),
    );

    first.unwrap();
    second.unwrap();

    let latest = t
        .platform
        .applications()
        .get(&application.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.status, ApplicationStatus::Approved);
    assert!(!latest.has_pending_steps());
}

#[tokio::test]
async fn test_concurrent_resolutions_of_the_same_step_conflict() {
    let t = TestPlatform::new().await;
    let user = t.seed_base_user().await;
    let application = t
        .platform
        .applications()
        .submit(ApplicationFactory::mentor(&user.user_id))
        .await
        .unwrap();

    let update = |outcome| {
        t.platform.applications().update_verification_step(StepUpdate {
            application_id: application.id.clone(),
            step: "document_review".into(),
            outcome,
            actor: "reviewer-1".into(),
            notes: None,
        })
    };

    let (first, second) = tokio::join!(update(StepOutcome::Completed), update(StepOutcome::Failed));

    let winners = usize::from(first.is_ok()) + usize::from(second.is_ok());
    assert_eq!(winners, 1, "a step can only be resolved once");

    let loser = if first.is_ok() { second } else { first };
    assert!(matches!(
        loser.unwrap_err(),
        PlatformError::StateConflict(_)
    ));
}
