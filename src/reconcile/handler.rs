//! Mount-scoped scheduling of the reconciler.
//!
//! Each mount waits a fixed delay so a session restored by a reload or a
//! redirect has time to settle, then runs the reconciler exactly once.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::{ReconcileOutcome, Reconciler};
use crate::config::DEFAULT_PENDING_DELAY;

/// Schedules a reconciliation run per mount.
pub struct PendingDataHandler {
    reconciler: Arc<Reconciler>,
    delay: Duration,
}

impl PendingDataHandler {
    pub fn new(reconciler: Arc<Reconciler>) -> Self {
        Self {
            reconciler,
            delay: DEFAULT_PENDING_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule one run after the start delay.
    ///
    /// Dropping or unmounting the returned handle before the delay elapses
    /// cancels the run. Once the body has started it runs to completion.
    pub fn mount(&self) -> MountedHandler {
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
        let reconciler = Arc::clone(&self.reconciler);
        let delay = self.delay;

        let task = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = &mut cancel_rx => {
                    tracing::debug!("Pending data check cancelled before start");
                    return None;
                }
            }
            Some(reconciler.run_once().await)
        });

        MountedHandler {
            cancel: Some(cancel_tx),
            task,
        }
    }
}

/// A scheduled run tied to the lifetime of its mount.
pub struct MountedHandler {
    cancel: Option<oneshot::Sender<()>>,
    task: JoinHandle<Option<ReconcileOutcome>>,
}

impl MountedHandler {
    /// Tear down the mount. Has no effect on a run already in progress.
    pub fn unmount(mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }

    /// Wait for the scheduled run. `None` if it was cancelled or the task
    /// was aborted.
    pub async fn finished(self) -> Option<ReconcileOutcome> {
        let MountedHandler { cancel, task } = self;
        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "Pending data task did not complete");
                None
            }
        };
        drop(cancel);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{SessionOracle, SessionUser};
    use crate::backend::MemoryBackend;
    use crate::error::AuthError;
    use crate::notify::LogNotifier;
    use crate::staging::{
        MemoryStagingStore, PENDING_PROFILE_DATA_KEY, StagedEducation, StagedPayload,
        StagingStore, stage_payload,
    };

    struct SignedIn;

    #[async_trait::async_trait]
    impl SessionOracle for SignedIn {
        async fn current_user(&self) -> Result<Option<SessionUser>, AuthError> {
            Ok(Some(SessionUser {
                id: "real-uuid".into(),
                email: None,
            }))
        }
    }

    async fn staged_handler() -> (PendingDataHandler, Arc<MemoryStagingStore>, Arc<MemoryBackend>) {
        let store = Arc::new(MemoryStagingStore::new());
        stage_payload(
            store.as_ref(),
            &StagedPayload {
                education: vec![StagedEducation::new("Bor High School")],
                work_experience: vec![],
                user_id: "abc".into(),
            },
        )
        .await
        .unwrap();

        let backend = Arc::new(MemoryBackend::new());
        let reconciler = Arc::new(Reconciler::new(
            store.clone(),
            Arc::new(SignedIn),
            backend.clone(),
            Arc::new(LogNotifier),
        ));
        (PendingDataHandler::new(reconciler), store, backend)
    }

    #[tokio::test(start_paused = true)]
    async fn runs_after_default_delay() {
        let (handler, store, backend) = staged_handler().await;
        assert_eq!(handler.delay(), Duration::from_secs(2));

        let mounted = handler.mount();
        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert!(store.get(PENDING_PROFILE_DATA_KEY).await.unwrap().is_some());
        assert!(backend.education().await.is_empty());

        let outcome = mounted.finished().await;
        assert!(matches!(outcome, Some(ReconcileOutcome::Applied(_))));
        assert_eq!(backend.education().await.len(), 1);
        assert!(store.get(PENDING_PROFILE_DATA_KEY).await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn unmount_before_delay_cancels() {
        let (handler, store, backend) = staged_handler().await;
        let handler = handler.with_delay(Duration::from_millis(500));

        let mounted = handler.mount();
        tokio::time::sleep(Duration::from_millis(100)).await;
        mounted.unmount();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(backend.total_insert_calls().await, 0);
        assert!(store.get(PENDING_PROFILE_DATA_KEY).await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_cancels() {
        let (handler, store, backend) = staged_handler().await;

        drop(handler.mount());
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(backend.total_insert_calls().await, 0);
        assert!(store.get(PENDING_PROFILE_DATA_KEY).await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn remount_retries_after_cancel() {
        let (handler, store, backend) = staged_handler().await;

        handler.mount().unmount();
        let outcome = handler.mount().finished().await;

        assert!(matches!(outcome, Some(ReconcileOutcome::Applied(_))));
        assert_eq!(backend.insert_calls("education").await, 1);
        assert!(store.is_empty().await);
    }
}
