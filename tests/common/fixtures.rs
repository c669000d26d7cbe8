//! Test fixtures and data factories
//!
//! Factory methods for creating test data with sensible defaults. All
//! factories create real objects, not mocks.

use rolegate::services::RecordingNotifier;
use rolegate::storage::IdentityStore;
use rolegate::{
    ApplicationDocument, Config, DocumentKind, Platform, Role, SubmitApplication, User,
    UserStatus,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Factory for creating test users
pub struct UserFactory;

impl UserFactory {
    /// Create a basic active user holding the base role
    pub fn create() -> User {
        let mut user = User::new(format!(
            "test-{}@example.com",
            &Uuid::new_v4().to_string()[..8]
        ));
        user.user_id = format!("user-{}", &Uuid::new_v4().to_string()[..8]);
        user
    }

    /// Create a user with a specific role set
    pub fn with_roles(roles: Vec<Role>) -> User {
        let mut user = Self::create();
        user.roles = roles;
        user
    }

    /// Create a suspended user
    pub fn suspended() -> User {
        let mut user = Self::create();
        user.status = UserStatus::Suspended;
        user
    }
}

/// Factory for creating application submissions
pub struct ApplicationFactory;

impl ApplicationFactory {
    /// Documents satisfying a role's required set
    pub fn documents_for(role: Role) -> Vec<ApplicationDocument> {
        let kinds: &[DocumentKind] = match role {
            Role::Mentor => &[DocumentKind::Resume, DocumentKind::Certification],
            Role::Writer => &[DocumentKind::WritingSample],
            Role::Seller => &[DocumentKind::BusinessLicense, DocumentKind::TaxDocument],
            _ => &[],
        };

        kinds
            .iter()
            .map(|kind| ApplicationDocument {
                kind: *kind,
                url: format!("memory://blobs/{kind}-{}", Uuid::new_v4()),
                name: format!("{kind}.pdf"),
                mime_type: "application/pdf".to_string(),
                size_bytes: 4096,
            })
            .collect()
    }

    /// A complete mentor submission
    pub fn mentor(user_id: &str) -> SubmitApplication {
        SubmitApplication {
            user_id: user_id.to_string(),
            role: Role::Mentor,
            fields: json!({
                "expertise": ["rust", "systems design"],
                "teachingMethodology": "hands-on project reviews",
                "yearsOfExperience": 8,
                "hourlyRate": 95.0,
            }),
            documents: Self::documents_for(Role::Mentor),
        }
    }

    /// A complete writer submission
    pub fn writer(user_id: &str) -> SubmitApplication {
        SubmitApplication {
            user_id: user_id.to_string(),
            role: Role::Writer,
            fields: json!({
                "specialties": ["devops", "observability"],
                "bio": "Infrastructure writer with a decade of production experience.",
            }),
            documents: Self::documents_for(Role::Writer),
        }
    }

    /// A complete seller submission
    pub fn seller(user_id: &str) -> SubmitApplication {
        SubmitApplication {
            user_id: user_id.to_string(),
            role: Role::Seller,
            fields: json!({
                "storeName": "Prairie Goods",
                "businessType": "llc",
                "productCategories": ["courseware", "templates"],
            }),
            documents: Self::documents_for(Role::Seller),
        }
    }

    /// A student submission
    pub fn student(user_id: &str) -> SubmitApplication {
        SubmitApplication {
            user_id: user_id.to_string(),
            role: Role::Student,
            fields: json!({ "interests": ["backend", "databases"] }),
            documents: vec![],
        }
    }
}

/// A pre-wired platform with a recording notifier
pub struct TestPlatform {
    pub platform: Platform,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestPlatform {
    /// Build with the default configuration
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    /// Build with a custom configuration
    pub async fn with_config(config: Config) -> Self {
        super::init_tracing();
        let notifier = Arc::new(RecordingNotifier::new());
        let platform = Platform::with_notifier(config, notifier.clone())
            .await
            .expect("platform must initialize");
        Self { platform, notifier }
    }

    /// Seed a user into the identity store
    pub async fn seed_user(&self, user: &User) {
        self.platform
            .storage()
            .store
            .insert_user(user)
            .await
            .expect("user insert must succeed");
    }

    /// Seed and return a fresh active base user
    pub async fn seed_base_user(&self) -> User {
        let user = UserFactory::create();
        self.seed_user(&user).await;
        user
    }
}
