//! Role-application state machine
//!
//! Every transition validates its preconditions before touching the
//! store, then applies its writes (application, user roles, verified
//! stamp) through one atomic commit. Optimistic-concurrency conflicts
//! are retried a bounded number of times by re-reading and
//! re-validating; a loser that finds the application already terminal
//! fails with a state conflict, never with corrupted state. Cache
//! invalidation follows every commit that touched a role set; audit
//! appends and notifications are best-effort.

use super::requirements::{requirements_for, validate_documents, ApplicationFields};
use super::types::{StepUpdate, SubmitApplication};
use crate::auth::rbac::{PermissionCache, PolicyModel, Role};
use crate::config::ApplicationsConfig;
use crate::core::models::{
    ApplicationDocument, ApplicationStatus, AuditLogEntry, AuditOutcome, DocumentKind,
    RoleApplication,
};
use crate::services::{notify_best_effort, NotificationTemplate, Notifier};
use crate::storage::{
    ApplicationStore, ApplicationTxn, ApplicationWrite, AuditSink, BlobMetadata, BlobStore,
    IdentityStore, UserWrite,
};
use crate::utils::error::{PlatformError, Result};
use chrono::{Duration, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Recipient key for administrative review notifications
const ADMIN_RECIPIENT: &str = "admins";

/// Manages the lifecycle of role applications
pub struct ApplicationManager {
    store: Arc<dyn ApplicationStore>,
    identity: Arc<dyn IdentityStore>,
    blobs: Arc<dyn BlobStore>,
    policy: Arc<PolicyModel>,
    cache: Arc<PermissionCache>,
    notifier: Arc<dyn Notifier>,
    audit: Arc<dyn AuditSink>,
    config: ApplicationsConfig,
}

impl ApplicationManager {
    /// Wire the manager over its collaborators
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn ApplicationStore>,
        identity: Arc<dyn IdentityStore>,
        blobs: Arc<dyn BlobStore>,
        policy: Arc<PolicyModel>,
        cache: Arc<PermissionCache>,
        notifier: Arc<dyn Notifier>,
        audit: Arc<dyn AuditSink>,
        config: ApplicationsConfig,
    ) -> Self {
        Self {
            store,
            identity,
            blobs,
            policy,
            cache,
            notifier,
            audit,
            config,
        }
    }

    /// Submit a role application
    ///
    /// Auto-approved roles are granted in the same commit that creates
    /// the application; there is no observable intermediate pending
    /// state for them.
    pub async fn submit(&self, request: SubmitApplication) -> Result<RoleApplication> {
        let mut attempts = 0;
        loop {
            match self.try_submit(&request).await {
                Err(e) if e.is_transient() && attempts < self.config.max_commit_retries => {
                    attempts += 1;
                    debug!(attempt = attempts, "retrying submit after commit conflict");
                }
                result => return result,
            }
        }
    }

    async fn try_submit(&self, request: &SubmitApplication) -> Result<RoleApplication> {
        let user = self
            .identity
            .get_user(&request.user_id)
            .await?
            .ok_or_else(|| {
                PlatformError::not_found(format!("user {} not found", request.user_id))
            })?;

        if !user.is_active() {
            return Err(PlatformError::state_conflict(
                "account is not active; applications require an active account",
            ));
        }
        if !user.has_role(Role::User) {
            return Err(PlatformError::policy(
                "only holders of the base user role may submit role applications",
            ));
        }
        if let Some(open) = self.store.find_open_for_user(&user.user_id).await? {
            return Err(PlatformError::state_conflict(format!(
                "you already have a {} application for role {}",
                open.status, open.role
            )));
        }

        let requirements = requirements_for(request.role).ok_or_else(|| {
            PlatformError::policy(format!(
                "role {} is not acquired through applications",
                request.role
            ))
        })?;

        if !user
            .roles
            .iter()
            .any(|held| self.policy.is_valid_role_transition(*held, request.role))
        {
            return Err(PlatformError::policy(format!(
                "transition to role {} is not allowed from the current role set",
                request.role
            )));
        }

        let resulting_roles = user.roles_with(request.role);
        if let Some(violation) = self.policy.validate_role_constraints(&resulting_roles) {
            return Err(PlatformError::policy(violation.to_string()));
        }

        if let Some(held) = user.specialized_roles().first() {
            return Err(PlatformError::state_conflict(format!(
                "user already holds the specialized role {held}; applying for {} is not allowed",
                request.role
            )));
        }

        ApplicationFields::parse(request.role, &request.fields)?;
        validate_documents(request.role, &request.documents)?;

        let auto_approved = self.config.is_auto_approved(request.role);
        let now = Utc::now();
        let mut application = RoleApplication::new(
            &request.user_id,
            request.role,
            request.fields.clone(),
            request.documents.clone(),
            if auto_approved {
                &[]
            } else {
                requirements.verification_steps
            },
        );

        let txn = if auto_approved {
            application.mark_approved(None, now);
            ApplicationTxn::with_user(
                ApplicationWrite::Insert(application.clone()),
                UserWrite {
                    user_id: user.user_id.clone(),
                    expected_version: user.version,
                    roles: Some(resulting_roles),
                    verified_role: Some((request.role, now)),
                },
            )
        } else {
            ApplicationTxn::application_only(ApplicationWrite::Insert(application.clone()))
        };

        self.store.commit(txn).await?;
        if auto_approved {
            self.cache.invalidate(&user.user_id);
        }

        info!(
            application_id = %application.id,
            user_id = %user.user_id,
            role = %request.role,
            auto_approved,
            "role application submitted"
        );
        self.append_audit(
            AuditLogEntry::new(
                &user.user_id,
                "application.submit",
                "applications",
                user.roles.clone(),
                AuditOutcome::Success,
            )
            .with_metadata(json!({
                "application_id": application.id,
                "role": request.role,
                "auto_approved": auto_approved,
            })),
        )
        .await;

        if auto_approved {
            notify_best_effort(
                self.notifier.as_ref(),
                &user.user_id,
                NotificationTemplate::ApplicationApproved,
                json!({ "role": request.role }),
            )
            .await;
        } else {
            notify_best_effort(
                self.notifier.as_ref(),
                &user.user_id,
                NotificationTemplate::ApplicationReceived,
                json!({ "role": request.role }),
            )
            .await;
            notify_best_effort(
                self.notifier.as_ref(),
                ADMIN_RECIPIENT,
                NotificationTemplate::AdminReviewRequested,
                json!({ "application_id": application.id, "role": request.role }),
            )
            .await;
        }

        Ok(application)
    }

    /// Resolve one verification step
    ///
    /// When the resolution leaves no step pending, the application
    /// lands on approved or rejected; an approval grants the role in
    /// the same commit.
    pub async fn update_verification_step(&self, update: StepUpdate) -> Result<RoleApplication> {
        let mut attempts = 0;
        loop {
            match self.try_update_step(&update).await {
                Err(e) if e.is_transient() && attempts < self.config.max_commit_retries => {
                    attempts += 1;
                    debug!(attempt = attempts, "retrying step update after commit conflict");
                }
                result => return result,
            }
        }
    }

    async fn try_update_step(&self, update: &StepUpdate) -> Result<RoleApplication> {
        let mut application = self
            .store
            .get_application(&update.application_id)
            .await?
            .ok_or_else(|| {
                PlatformError::not_found(format!(
                    "application {} not found",
                    update.application_id
                ))
            })?;

        let expected_version = application.version;
        let now = Utc::now();
        let new_status = application.resolve_step(
            &update.step,
            update.outcome,
            &update.actor,
            update.notes.clone(),
            now,
        )?;

        let txn = if new_status == ApplicationStatus::Approved {
            let user = self
                .identity
                .get_user(&application.user_id)
                .await?
                .ok_or_else(|| {
                    PlatformError::not_found(format!("user {} not found", application.user_id))
                })?;

            // The user's roles may have changed since submission;
            // re-check the resulting set before granting.
            let resulting_roles = user.roles_with(application.role);
            if let Some(violation) = self.policy.validate_role_constraints(&resulting_roles) {
                return Err(PlatformError::policy(format!(
                    "cannot grant role {}: {violation}",
                    application.role
                )));
            }

            application.reviewed_by = Some(update.actor.clone());
            application.reviewed_at = Some(now);
            ApplicationTxn::with_user(
                ApplicationWrite::Update {
                    application: application.clone(),
                    expected_version,
                },
                UserWrite {
                    user_id: user.user_id.clone(),
                    expected_version: user.version,
                    roles: Some(resulting_roles),
                    verified_role: Some((application.role, now)),
                },
            )
        } else {
            ApplicationTxn::application_only(ApplicationWrite::Update {
                application: application.clone(),
                expected_version,
            })
        };

        self.store.commit(txn).await?;
        application.version = expected_version + 1;
        if new_status == ApplicationStatus::Approved {
            self.cache.invalidate(&application.user_id);
        }

        info!(
            application_id = %application.id,
            step = %update.step,
            outcome = ?update.outcome,
            status = %new_status,
            "verification step resolved"
        );
        self.append_audit(
            AuditLogEntry::new(
                &update.actor,
                "application.step",
                "applications",
                vec![],
                AuditOutcome::Success,
            )
            .with_metadata(json!({
                "application_id": application.id,
                "step": update.step,
                "outcome": update.outcome,
                "status": new_status,
            })),
        )
        .await;

        match new_status {
            ApplicationStatus::Approved => {
                notify_best_effort(
                    self.notifier.as_ref(),
                    &application.user_id,
                    NotificationTemplate::ApplicationApproved,
                    json!({ "role": application.role }),
                )
                .await;
            }
            ApplicationStatus::Rejected => {
                notify_best_effort(
                    self.notifier.as_ref(),
                    &application.user_id,
                    NotificationTemplate::ApplicationRejected,
                    json!({ "role": application.role, "reason": application.rejection_reason }),
                )
                .await;
            }
            _ => {}
        }

        Ok(application)
    }

    /// Approve an application administratively
    ///
    /// Only valid once no verification step remains pending; the
    /// resulting role set is re-checked at approval time.
    pub async fn approve(&self, application_id: &str, reviewer: &str) -> Result<RoleApplication> {
        let mut attempts = 0;
        loop {
            match self.try_approve(application_id, reviewer).await {
                Err(e) if e.is_transient() && attempts < self.config.max_commit_retries => {
                    attempts += 1;
                    debug!(attempt = attempts, "retrying approval after commit conflict");
                }
                result => return result,
            }
        }
    }

    async fn try_approve(&self, application_id: &str, reviewer: &str) -> Result<RoleApplication> {
        let mut application = self
            .store
            .get_application(application_id)
            .await?
            .ok_or_else(|| {
                PlatformError::not_found(format!("application {application_id} not found"))
            })?;

        if !application.status.is_open() {
            return Err(PlatformError::state_conflict(format!(
                "application is {} and cannot be approved",
                application.status
            )));
        }
        if application.has_pending_steps() {
            return Err(PlatformError::state_conflict(
                "verification steps are still pending; resolve them before approval",
            ));
        }

        let user = self
            .identity
            .get_user(&application.user_id)
            .await?
            .ok_or_else(|| {
                PlatformError::not_found(format!("user {} not found", application.user_id))
            })?;

        let resulting_roles = user.roles_with(application.role);
        if let Some(violation) = self.policy.validate_role_constraints(&resulting_roles) {
            return Err(PlatformError::policy(format!(
                "cannot grant role {}: {violation}",
                application.role
            )));
        }

        let expected_version = application.version;
        let now = Utc::now();
        application.mark_approved(Some(reviewer), now);

        self.store
            .commit(ApplicationTxn::with_user(
                ApplicationWrite::Update {
                    application: application.clone(),
                    expected_version,
                },
                UserWrite {
                    user_id: user.user_id.clone(),
                    expected_version: user.version,
                    roles: Some(resulting_roles),
                    verified_role: Some((application.role, now)),
                },
            ))
            .await?;
        application.version = expected_version + 1;
        self.cache.invalidate(&application.user_id);

        info!(
            application_id = %application.id,
            user_id = %application.user_id,
            role = %application.role,
            reviewer,
            "application approved"
        );
        self.append_audit(
            AuditLogEntry::new(
                reviewer,
                "application.approve",
                "applications",
                vec![],
                AuditOutcome::Success,
            )
            .with_metadata(json!({
                "application_id": application.id,
                "user_id": application.user_id,
                "role": application.role,
            })),
        )
        .await;
        notify_best_effort(
            self.notifier.as_ref(),
            &application.user_id,
            NotificationTemplate::ApplicationApproved,
            json!({ "role": application.role }),
        )
        .await;

        Ok(application)
    }

    /// Reject an application with a reason
    pub async fn reject(
        &self,
        application_id: &str,
        reviewer: &str,
        reason: &str,
    ) -> Result<RoleApplication> {
        if reason.trim().is_empty() {
            return Err(PlatformError::validation(
                "rejection reason must not be empty",
            ));
        }

        let mut attempts = 0;
        loop {
            match self.try_reject(application_id, reviewer, reason).await {
                Err(e) if e.is_transient() && attempts < self.config.max_commit_retries => {
                    attempts += 1;
                    debug!(attempt = attempts, "retrying rejection after commit conflict");
                }
                result => return result,
            }
        }
    }

    async fn try_reject(
        &self,
        application_id: &str,
        reviewer: &str,
        reason: &str,
    ) -> Result<RoleApplication> {
        let mut application = self
            .store
            .get_application(application_id)
            .await?
            .ok_or_else(|| {
                PlatformError::not_found(format!("application {application_id} not found"))
            })?;

        if !application.status.is_open() {
            return Err(PlatformError::state_conflict(format!(
                "application is {} and cannot be rejected",
                application.status
            )));
        }

        let expected_version = application.version;
        application.mark_rejected(Some(reviewer), reason.to_string(), Utc::now());

        self.store
            .commit(ApplicationTxn::application_only(ApplicationWrite::Update {
                application: application.clone(),
                expected_version,
            }))
            .await?;
        application.version = expected_version + 1;

        info!(
            application_id = %application.id,
            reviewer,
            "application rejected"
        );
        self.append_audit(
            AuditLogEntry::new(
                reviewer,
                "application.reject",
                "applications",
                vec![],
                AuditOutcome::Success,
            )
            .with_metadata(json!({
                "application_id": application.id,
                "reason": reason,
            })),
        )
        .await;
        notify_best_effort(
            self.notifier.as_ref(),
            &application.user_id,
            NotificationTemplate::ApplicationRejected,
            json!({ "role": application.role, "reason": reason }),
        )
        .await;

        Ok(application)
    }

    /// Withdraw an open application
    ///
    /// Only the owning user may withdraw, and only while the
    /// application is pending or in review. Serializable against a
    /// concurrent step update resolving the application: the loser of
    /// the race fails cleanly.
    pub async fn withdraw(&self, application_id: &str, caller: &str) -> Result<()> {
        let mut attempts = 0;
        loop {
            match self.try_withdraw(application_id, caller).await {
                Err(e) if e.is_transient() && attempts < self.config.max_commit_retries => {
                    attempts += 1;
                    debug!(attempt = attempts, "retrying withdrawal after commit conflict");
                }
                result => return result,
            }
        }
    }

    async fn try_withdraw(&self, application_id: &str, caller: &str) -> Result<()> {
        let application = self
            .store
            .get_application(application_id)
            .await?
            .ok_or_else(|| {
                PlatformError::not_found(format!("application {application_id} not found"))
            })?;

        if application.user_id != caller {
            return Err(PlatformError::policy(
                "only the applicant may withdraw an application",
            ));
        }
        if !application.status.is_open() {
            return Err(PlatformError::state_conflict(format!(
                "application is {}; not in a withdrawable state",
                application.status
            )));
        }

        let prior_status = application.status;
        self.store
            .commit(ApplicationTxn::application_only(ApplicationWrite::Delete {
                application_id: application.id.clone(),
                expected_version: application.version,
            }))
            .await?;

        info!(
            application_id = %application.id,
            user_id = %application.user_id,
            %prior_status,
            "application withdrawn"
        );
        self.append_audit(
            AuditLogEntry::new(
                caller,
                "application.withdraw",
                "applications",
                vec![],
                AuditOutcome::Success,
            )
            .with_metadata(json!({
                "application_id": application.id,
                "role": application.role,
                "prior_status": prior_status,
            })),
        )
        .await;
        notify_best_effort(
            self.notifier.as_ref(),
            &application.user_id,
            NotificationTemplate::ApplicationWithdrawn,
            json!({ "role": application.role }),
        )
        .await;

        Ok(())
    }

    /// Close an open application administratively
    pub async fn cancel(&self, application_id: &str, actor: &str) -> Result<RoleApplication> {
        let mut application = self
            .store
            .get_application(application_id)
            .await?
            .ok_or_else(|| {
                PlatformError::not_found(format!("application {application_id} not found"))
            })?;

        if !application.status.is_open() {
            return Err(PlatformError::state_conflict(format!(
                "application is {} and cannot be cancelled",
                application.status
            )));
        }

        let expected_version = application.version;
        application.mark_cancelled(Utc::now());
        self.store
            .commit(ApplicationTxn::application_only(ApplicationWrite::Update {
                application: application.clone(),
                expected_version,
            }))
            .await?;
        application.version = expected_version + 1;

        info!(application_id = %application.id, actor, "application cancelled");
        self.append_audit(
            AuditLogEntry::new(
                actor,
                "application.cancel",
                "applications",
                vec![],
                AuditOutcome::Success,
            )
            .with_metadata(json!({ "application_id": application.id })),
        )
        .await;

        Ok(application)
    }

    /// Expire open applications older than the configured TTL
    ///
    /// Used by the periodic maintenance sweep; concurrent updates to an
    /// individual application simply skip it this round.
    pub async fn expire_stale(&self) -> Result<usize> {
        let cutoff = Utc::now() - Duration::days(i64::from(self.config.application_ttl_days));
        let stale = self.store.list_open_created_before(cutoff).await?;

        let mut expired = 0usize;
        for mut application in stale {
            let expected_version = application.version;
            application.mark_expired(Utc::now());
            match self
                .store
                .commit(ApplicationTxn::application_only(ApplicationWrite::Update {
                    application: application.clone(),
                    expected_version,
                }))
                .await
            {
                Ok(()) => {
                    expired += 1;
                    self.append_audit(
                        AuditLogEntry::new(
                            "system",
                            "application.expire",
                            "applications",
                            vec![],
                            AuditOutcome::Success,
                        )
                        .with_metadata(json!({ "application_id": application.id })),
                    )
                    .await;
                }
                Err(e) if e.is_transient() => {
                    debug!(application_id = %application.id, "skipping concurrently updated application");
                }
                Err(e) => return Err(e),
            }
        }

        if expired > 0 {
            info!(expired, "expired stale applications");
        }
        Ok(expired)
    }

    /// Fetch an application by id
    pub async fn get(&self, application_id: &str) -> Result<Option<RoleApplication>> {
        self.store.get_application(application_id).await
    }

    /// All applications belonging to a user
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<RoleApplication>> {
        self.store.list_for_user(user_id).await
    }

    /// Upload a supporting document and return the attachment record
    ///
    /// File contents go straight to the blob store; only the returned
    /// handle is kept.
    pub async fn upload_document(
        &self,
        kind: DocumentKind,
        name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<ApplicationDocument> {
        let blob = self
            .blobs
            .upload(
                bytes,
                BlobMetadata {
                    name: name.to_string(),
                    mime_type: mime_type.to_string(),
                },
            )
            .await?;

        Ok(ApplicationDocument {
            kind,
            url: blob.url,
            name: name.to_string(),
            mime_type: blob.mime_type,
            size_bytes: blob.size_bytes,
        })
    }

    async fn append_audit(&self, entry: AuditLogEntry) {
        if let Err(error) = self.audit.append(entry).await {
            warn!(%error, "audit append failed");
        }
    }
}
