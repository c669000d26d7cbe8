//! Storage boundary traits
//!
//! The engine is persistence-agnostic: it talks to an identity store,
//! an application store with atomic multi-document commits, a blob
//! store, and an audit sink through these traits. Writes carry expected
//! versions; a mismatch anywhere aborts the whole commit with a
//! transaction conflict and no partial state.

use crate::auth::rbac::{Permission, Role};
use crate::core::models::{AuditLogEntry, RoleApplication, User};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Identity store: the user-record aspect the engine reads and mutates
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Fetch a user by id
    async fn get_user(&self, user_id: &str) -> Result<Option<User>>;

    /// Insert a new user record
    async fn insert_user(&self, user: &User) -> Result<()>;

    /// Replace a user's role set, guarded by the expected version
    async fn update_user_roles(
        &self,
        user_id: &str,
        roles: Vec<Role>,
        expected_version: u64,
    ) -> Result<()>;

    /// Stamp a role as verified on the user's role-specific data
    async fn set_role_verified(
        &self,
        user_id: &str,
        role: Role,
        verified_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Replace a user's custom permission grants, guarded by the
    /// expected version
    async fn update_custom_permissions(
        &self,
        user_id: &str,
        permissions: Vec<Permission>,
        expected_version: u64,
    ) -> Result<()>;
}

/// The application write staged in a transaction
#[derive(Debug, Clone)]
pub enum ApplicationWrite {
    /// Insert a new application
    ///
    /// Stores must reject the insert if the user already has an open
    /// application (the single-open-application invariant is enforced
    /// at the storage layer, like a unique partial index).
    Insert(RoleApplication),
    /// Replace an existing application
    Update {
        application: RoleApplication,
        expected_version: u64,
    },
    /// Remove an application
    Delete {
        application_id: String,
        expected_version: u64,
    },
}

/// The user write staged alongside an application write
#[derive(Debug, Clone)]
pub struct UserWrite {
    /// Target user
    pub user_id: String,
    /// Version the caller read the user at
    pub expected_version: u64,
    /// New role set, if the transition grants a role
    pub roles: Option<Vec<Role>>,
    /// Role to stamp verified, with the verification date
    pub verified_role: Option<(Role, DateTime<Utc>)>,
}

/// An atomic unit of work: one application write plus an optional user
/// write, committed all-or-nothing
#[derive(Debug, Clone)]
pub struct ApplicationTxn {
    pub application: ApplicationWrite,
    pub user: Option<UserWrite>,
}

impl ApplicationTxn {
    /// A transaction touching only the application record
    pub fn application_only(write: ApplicationWrite) -> Self {
        Self {
            application: write,
            user: None,
        }
    }

    /// A transaction that also mutates the user record
    pub fn with_user(write: ApplicationWrite, user: UserWrite) -> Self {
        Self {
            application: write,
            user: Some(user),
        }
    }
}

/// Application store with atomic multi-document commits
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Fetch an application by id
    async fn get_application(&self, application_id: &str) -> Result<Option<RoleApplication>>;

    /// Fetch a user's open (pending or in-review) application, if any
    async fn find_open_for_user(&self, user_id: &str) -> Result<Option<RoleApplication>>;

    /// All applications belonging to a user
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<RoleApplication>>;

    /// Open applications created before the cutoff
    async fn list_open_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<RoleApplication>>;

    /// Commit a transaction atomically
    ///
    /// Every version check runs before any write; on a mismatch the
    /// commit fails with a transaction conflict and nothing is applied.
    async fn commit(&self, txn: ApplicationTxn) -> Result<()>;
}

/// Append-only audit sink
///
/// Appends are best-effort: a failure here is logged by the caller and
/// never rolls back the state transition that produced the entry.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append an entry
    async fn append(&self, entry: AuditLogEntry) -> Result<()>;

    /// Drop entries older than the cutoff, returning how many were
    /// removed
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize>;
}

/// Metadata supplied with a blob upload
#[derive(Debug, Clone)]
pub struct BlobMetadata {
    /// Original file name
    pub name: String,
    /// MIME type
    pub mime_type: String,
}

/// Handle returned by a blob upload
#[derive(Debug, Clone)]
pub struct StoredBlob {
    /// Storage identifier
    pub id: String,
    /// Resolvable URL
    pub url: String,
    /// MIME type as stored
    pub mime_type: String,
    /// Size in bytes
    pub size_bytes: u64,
}

/// Opaque blob store
///
/// The engine stores only the returned url/id/mime/size; it never
/// inspects file contents.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload raw bytes, returning the stored handle
    async fn upload(&self, bytes: Vec<u8>, metadata: BlobMetadata) -> Result<StoredBlob>;
}
