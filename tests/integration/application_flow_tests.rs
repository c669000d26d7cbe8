//! Role-application lifecycle integration tests

use crate::common::{
    assert_mentions, assert_policy, assert_state_conflict, assert_validation, ApplicationFactory,
    TestPlatform, UserFactory,
};
use rolegate::services::NotificationTemplate;
use rolegate::storage::IdentityStore;
use rolegate::{ApplicationStatus, Role, StepOutcome, StepUpdate};
use serde_json::json;

#[tokio::test]
async fn test_full_mentor_lifecycle() {
    let t = TestPlatform::new().await;
    let user = t.seed_base_user().await;

    let application = t
        .platform
        .applications()
        .submit(ApplicationFactory::mentor(&user.user_id))
        .await
        .unwrap();
    assert_eq!(application.status, ApplicationStatus::Pending);
    assert_eq!(application.steps.len(), 3);

    // Resolve each step; the application approves on the last one
    for (index, step) in ["document_review", "background_check", "interview"]
        .iter()
        .enumerate()
    {
        let latest = t
            .platform
            .applications()
            .update_verification_step(StepUpdate {
                application_id: application.id.clone(),
                step: step.to_string(),
                outcome: StepOutcome::Completed,
                actor: "reviewer-1".into(),
                notes: None,
            })
            .await
            .unwrap();

        if index < 2 {
            assert_eq!(latest.status, ApplicationStatus::InReview);
        } else {
            assert_eq!(latest.status, ApplicationStatus::Approved);
        }
    }

    let stored = t
        .platform
        .storage()
        .store
        .get_user(&user.user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.roles, vec![Role::User, Role::Mentor]);
    assert!(stored.role_data[&Role::Mentor].verified);
    assert!(stored.role_data[&Role::Mentor].verified_at.is_some());

    assert!(t.notifier.sent().contains(&(
        user.user_id.clone(),
        NotificationTemplate::ApplicationApproved
    )));
}

#[tokio::test]
async fn test_student_auto_approval_has_no_pending_state() {
    let t = TestPlatform::new().await;
    let user = t.seed_base_user().await;

    let application = t
        .platform
        .applications()
        .submit(ApplicationFactory::student(&user.user_id))
        .await
        .unwrap();

    // Created already approved, role granted in the same commit
    assert_eq!(application.status, ApplicationStatus::Approved);
    let stored = t
        .platform
        .storage()
        .store
        .get_user(&user.user_id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.has_role(Role::Student));

    // The stored application agrees with the returned one
    let persisted = t
        .platform
        .applications()
        .get(&application.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(persisted.status, ApplicationStatus::Approved);
}

#[tokio::test]
async fn test_duplicate_open_application_is_specific() {
    let t = TestPlatform::new().await;
    let user = t.seed_base_user().await;

    t.platform
        .applications()
        .submit(ApplicationFactory::writer(&user.user_id))
        .await
        .unwrap();

    let err = t
        .platform
        .applications()
        .submit(ApplicationFactory::writer(&user.user_id))
        .await
        .unwrap_err();
    assert_state_conflict(&err);
    assert_mentions(&err, "writer");
}

#[tokio::test]
async fn test_mentor_with_missing_methodology_field() {
    let t = TestPlatform::new().await;
    let user = t.seed_base_user().await;

    let mut request = ApplicationFactory::mentor(&user.user_id);
    request.fields = json!({
        "expertise": ["rust"],
        "yearsOfExperience": 8,
    });

    let err = t.platform.applications().submit(request).await.unwrap_err();
    assert_validation(&err);
    assert_mentions(&err, "teachingMethodology");
}

#[tokio::test]
async fn test_mentor_cannot_become_student() {
    let t = TestPlatform::new().await;
    let mentor = UserFactory::with_roles(vec![Role::User, Role::Mentor]);
    t.seed_user(&mentor).await;

    let err = t
        .platform
        .applications()
        .submit(ApplicationFactory::student(&mentor.user_id))
        .await
        .unwrap_err();
    assert_policy(&err);
    assert_mentions(&err, "mutually exclusive");
}

#[tokio::test]
async fn test_failed_verification_rejects_without_role_change() {
    let t = TestPlatform::new().await;
    let user = t.seed_base_user().await;
    let application = t
        .platform
        .applications()
        .submit(ApplicationFactory::writer(&user.user_id))
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
    let latest = t
        .platform
        .applications()
        .update_verification_step(StepUpdate {
            application_id: application.id.clone(),
            step: "sample_review".into(),
            outcome: StepOutcome::Failed,
            actor: "reviewer-1".into(),
            notes: Some("sample did not meet the bar".into()),
        })
        .await
        .unwrap();

    assert_eq!(latest.status, ApplicationStatus::Rejected);
    let stored = t
        .platform
        .storage()
        .store
        .get_user(&user.user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.roles, vec![Role::User]);

    assert!(t.notifier.sent().contains(&(
        user.user_id.clone(),
        NotificationTemplate::ApplicationRejected
    )));
}

#[tokio::test]
async fn test_withdraw_legality_matrix() {
    let t = TestPlatform::new().await;

    // Withdraw from pending succeeds
    let user = t.seed_base_user().await;
    let application = t
        .platform
        .applications()
        .submit(ApplicationFactory::seller(&user.user_id))
        .await
        .unwrap();
    t.platform
        .applications()
        .withdraw(&application.id, &user.user_id)
        .await
        .unwrap();
    assert!(t
        .platform
        .applications()
        .get(&application.id)
        .await
        .unwrap()
        .is_none());

    // Withdraw from in_review succeeds
    let application = t
        .platform
        .applications()
        .submit(ApplicationFactory::seller(&user.user_id))
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
    t.platform
        .applications()
        .withdraw(&application.id, &user.user_id)
        .await
        .unwrap();

    // Withdraw from a terminal state fails
    let application = t
        .platform
        .applications()
        .submit(ApplicationFactory::seller(&user.user_id))
        .await
        .unwrap();
    t.platform
        .applications()
        .reject(&application.id, "reviewer-1", "incomplete paperwork")
        .await
        .unwrap();
    let err = t
        .platform
        .applications()
        .withdraw(&application.id, &user.user_id)
        .await
        .unwrap_err();
    assert_state_conflict(&err);
    assert_mentions(&err, "not in a withdrawable state");

    // Role set never changed across all of the above
    let stored = t
        .platform
        .storage()
        .store
        .get_user(&user.user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.roles, vec![Role::User]);
}

#[tokio::test]
async fn test_suspended_user_cannot_submit() {
    let t = TestPlatform::new().await;
    let user = UserFactory::suspended();
    t.seed_user(&user).await;

    let err = t
        .platform
        .applications()
        .submit(ApplicationFactory::student(&user.user_id))
        .await
        .unwrap_err();
    assert_state_conflict(&err);
    assert_mentions(&err, "not active");
}

#[tokio::test]
async fn test_maintenance_expires_old_applications() {
    let t = TestPlatform::new().await;
    let user = t.seed_base_user().await;
    t.platform
        .applications()
        .submit(ApplicationFactory::mentor(&user.user_id))
        .await
        .unwrap();

    // A fresh application is untouched by maintenance
    let report = t.platform.run_maintenance().await.unwrap();
    assert_eq!(report.expired_applications, 0);
}
