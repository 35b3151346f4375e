//! Pending profile data reconciliation.
//!
//! Sign-up may finish before the session is usable, so registration stages
//! education and work-experience records on the device. The reconciler picks
//! them up on a later mount, writes them for the signed-in user, and clears
//! the slot.
//!
//! Failure handling:
//! - unparseable payload or no session: entry kept, retried on next mount
//! - insert failure: logged, entry still cleared (at most once)

pub mod handler;

pub use handler::{MountedHandler, PendingDataHandler};

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::auth::SessionOracle;
use crate::backend::{EducationInsert, ProfileBackend, WorkExperienceInsert};
use crate::notify::{Notification, Notifier};
use crate::staging::{PENDING_PROFILE_DATA_KEY, StagedPayload, StagingStore};

/// Result of one insert step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertStatus {
    /// Nothing staged for this collection.
    Skipped,
    /// Batch accepted with this many records.
    Inserted(usize),
    /// Batch rejected; the error was logged and swallowed.
    Failed(String),
}

impl InsertStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// What happened to the staged records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    pub user_id: String,
    pub education: InsertStatus,
    pub work_experience: InsertStatus,
    /// Whether the staging entry was removed.
    pub cleared: bool,
}

/// Outcome of a reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No staged entry (the common case).
    NothingPending,
    /// The staging store could not be read; entry untouched.
    StoreUnavailable,
    /// The entry is not a valid payload; kept for inspection.
    Unparseable,
    /// No signed-in user; entry kept for the next mount.
    NoSession,
    /// Inserts were attempted.
    Applied(ApplyReport),
}

/// Drains the pending-data slot into the backend for the signed-in user.
pub struct Reconciler {
    store: Arc<dyn StagingStore>,
    session: Arc<dyn SessionOracle>,
    backend: Arc<dyn ProfileBackend>,
    notifier: Arc<dyn Notifier>,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn StagingStore>,
        session: Arc<dyn SessionOracle>,
        backend: Arc<dyn ProfileBackend>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            session,
            backend,
            notifier,
        }
    }

    /// Run the reconciliation body once. Never fails; see [`ReconcileOutcome`].
    pub async fn run_once(&self) -> ReconcileOutcome {
        let raw = match self.store.get(PENDING_PROFILE_DATA_KEY).await {
            Ok(Some(raw)) if !raw.trim().is_empty() => raw,
            Ok(_) => {
                debug!("No pending profile data");
                return ReconcileOutcome::NothingPending;
            }
            Err(e) => {
                error!(error = %e, "Failed to read pending profile data");
                return ReconcileOutcome::StoreUnavailable;
            }
        };

        let payload = match StagedPayload::parse(&raw) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "Error processing pending data: payload is not valid");
                return ReconcileOutcome::Unparseable;
            }
        };

        // The staged userId is informational; only the live session decides
        // who owns the records.
        let user = match self.session.current_user().await {
            Ok(Some(user)) => user,
            Ok(None) => {
                debug!("Pending profile data waiting for a session");
                return ReconcileOutcome::NoSession;
            }
            Err(e) => {
                warn!(error = %e, "Session check failed; keeping pending profile data");
                return ReconcileOutcome::NoSession;
            }
        };

        if !payload.user_id.is_empty() && payload.user_id != user.id {
            warn!(
                staged_user = %payload.user_id,
                session_user = %user.id,
                "Pending data was staged by a different account; using the session user"
            );
        }

        let education = self.insert_education(&user.id, &payload).await;
        let work_experience = self.insert_work_experience(&user.id, &payload).await;

        let cleared = match self.store.delete(PENDING_PROFILE_DATA_KEY).await {
            Ok(_) => true,
            Err(e) => {
                error!(error = %e, "Failed to clear pending profile data");
                false
            }
        };

        if cleared {
            self.notifier
                .notify(Notification::success(
                    "Profile completed",
                    "Your education and work experience have been added to your profile.",
                ))
                .await;
        }

        info!(
            user_id = %user.id,
            education = ?education,
            work_experience = ?work_experience,
            cleared,
            "Pending profile data reconciled"
        );

        ReconcileOutcome::Applied(ApplyReport {
            user_id: user.id,
            education,
            work_experience,
            cleared,
        })
    }

    async fn insert_education(&self, user_id: &str, payload: &StagedPayload) -> InsertStatus {
        if payload.education.is_empty() {
            return InsertStatus::Skipped;
        }
        let records: Vec<EducationInsert> = payload
            .education
            .iter()
            .map(|e| EducationInsert::from_staged(user_id, e))
            .collect();

        match self.backend.insert_education(&records).await {
            Ok(()) => InsertStatus::Inserted(records.len()),
            Err(e) => {
                error!(error = %e, "Education insert error");
                InsertStatus::Failed(e.to_string())
            }
        }
    }

    async fn insert_work_experience(&self, user_id: &str, payload: &StagedPayload) -> InsertStatus {
        if payload.work_experience.is_empty() {
            return InsertStatus::Skipped;
        }
        let records: Vec<WorkExperienceInsert> = payload
            .work_experience
            .iter()
            .map(|w| WorkExperienceInsert::from_staged(user_id, w))
            .collect();

        match self.backend.insert_work_experience(&records).await {
            Ok(()) => InsertStatus::Inserted(records.len()),
            Err(e) => {
                error!(error = %e, "Work experience insert error");
                InsertStatus::Failed(e.to_string())
            }
        }
    }
}
