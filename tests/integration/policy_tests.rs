//! Policy and authorization integration tests
//!
//! Exercises permission resolution through the cache and the guard's
//! decision surface against the assembled platform.

use crate::common::{ApplicationFactory, TestPlatform, UserFactory};
use rolegate::{AccessDecision, DenialReason, PermissionAction, Resource, Role};

#[tokio::test]
async fn test_base_user_read_allowed_write_denied() {
    let t = TestPlatform::new().await;
    let user = t.seed_base_user().await;

    let read = t
        .platform
        .access()
        .authorize_user(&user.user_id, Resource::Courses, PermissionAction::Read)
        .await
        .unwrap();
    assert!(read.is_allowed());

    let update = t
        .platform
        .access()
        .authorize_user(&user.user_id, Resource::Courses, PermissionAction::Update)
        .await
        .unwrap();
    assert!(!update.is_allowed());
}

#[tokio::test]
async fn test_admin_manage_covers_every_action() {
    let t = TestPlatform::new().await;
    let admin = UserFactory::with_roles(vec![Role::Admin]);
    t.seed_user(&admin).await;

    for resource in [Resource::Users, Resource::Payouts, Resource::Applications] {
        for action in [
            PermissionAction::Create,
            PermissionAction::Read,
            PermissionAction::Update,
            PermissionAction::Delete,
            PermissionAction::Manage,
        ] {
            let decision = t
                .platform
                .access()
                .authorize_user(&admin.user_id, resource, action)
                .await
                .unwrap();
            assert!(decision.is_allowed(), "admin denied {action} on {resource}");
        }
    }
}

#[tokio::test]
async fn test_authorize_is_idempotent_across_cache_paths() {
    let t = TestPlatform::new().await;
    let user = t.seed_base_user().await;

    // Miss path, then hit path
    let first = t
        .platform
        .access()
        .authorize_user(&user.user_id, Resource::Articles, PermissionAction::Read)
        .await
        .unwrap();
    let second = t
        .platform
        .access()
        .authorize_user(&user.user_id, Resource::Articles, PermissionAction::Read)
        .await
        .unwrap();

    assert_eq!(first, second);
    let stats = t.platform.cache().stats();
    assert!(stats.hits >= 1);
    assert!(stats.misses >= 1);
}

#[tokio::test]
async fn test_role_grant_immediately_visible_in_resolution() {
    let t = TestPlatform::new().await;
    let user = t.seed_base_user().await;

    // Before the grant a student-only permission is denied (and the
    // denial primes the cache)
    let before = t
        .platform
        .access()
        .authorize_user(&user.user_id, Resource::Sessions, PermissionAction::Create)
        .await
        .unwrap();
    assert!(!before.is_allowed());

    // Student applications auto-approve and grant the role atomically
    t.platform
        .applications()
        .submit(ApplicationFactory::student(&user.user_id))
        .await
        .unwrap();

    // The stale cached set must not be served after the grant
    let after = t
        .platform
        .access()
        .authorize_user(&user.user_id, Resource::Sessions, PermissionAction::Create)
        .await
        .unwrap();
    assert!(after.is_allowed());
}

#[tokio::test]
async fn test_denial_reason_is_opaque() {
    let t = TestPlatform::new().await;
    let user = t.seed_base_user().await;

    let decision = t
        .platform
        .access()
        .authorize_user(&user.user_id, Resource::Payouts, PermissionAction::Read)
        .await
        .unwrap();

    match decision {
        AccessDecision::Deny { reason } => {
            assert_eq!(reason, DenialReason::InsufficientPermission);
            // The public message must not leak the missing permission
            let message = reason.public_message();
            assert_eq!(message, "insufficient permission");
            assert!(!message.contains("payouts"));
        }
        AccessDecision::Allow => panic!("expected denial"),
    }
}

#[tokio::test]
async fn test_decisions_land_in_the_audit_trail() {
    let t = TestPlatform::new().await;
    let user = t.seed_base_user().await;

    t.platform
        .access()
        .authorize_user(&user.user_id, Resource::Courses, PermissionAction::Read)
        .await
        .unwrap();
    t.platform
        .access()
        .authorize_user(&user.user_id, Resource::Payouts, PermissionAction::Read)
        .await
        .unwrap();

    let entries = t.platform.storage().audit.entries();
    let decisions: Vec<_> = entries.iter().filter(|e| e.action == "authorize").collect();
    assert_eq!(decisions.len(), 2);
    assert_eq!(decisions[0].actor, user.user_id);
}
