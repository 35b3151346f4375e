//! Account creation followed by profile completion.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AuthClient, SignUpRequest};
use crate::backend::{PhotoStorage, ProfileBackend};
use crate::config::DEFAULT_PROFILE_TRIGGER_DELAY;
use crate::error::RegistrationError;
use crate::notify::{Notification, Notifier};
use crate::staging::{StagingStore, stage_payload};

use super::form::JoinForm;

/// A profile photo picked on the join screen.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl PhotoUpload {
    /// Storage path for this photo under the owner's folder.
    pub fn storage_path(&self, user_id: &str) -> String {
        let ext = Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .unwrap_or("jpg");
        format!("{user_id}/profile.{ext}")
    }
}

/// Result of a completed registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredUser {
    pub user_id: String,
    pub profile_photo_url: Option<String>,
    /// Whether nested records were left in the staging slot.
    pub staged: bool,
}

/// Drives the join screen submission.
pub struct RegistrationFlow {
    auth: Arc<dyn AuthClient>,
    photos: Arc<dyn PhotoStorage>,
    backend: Arc<dyn ProfileBackend>,
    store: Arc<dyn StagingStore>,
    notifier: Arc<dyn Notifier>,
    profile_trigger_delay: Duration,
    redirect_to: Option<String>,
}

impl RegistrationFlow {
    pub fn new(
        auth: Arc<dyn AuthClient>,
        photos: Arc<dyn PhotoStorage>,
        backend: Arc<dyn ProfileBackend>,
        store: Arc<dyn StagingStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            auth,
            photos,
            backend,
            store,
            notifier,
            profile_trigger_delay: DEFAULT_PROFILE_TRIGGER_DELAY,
            redirect_to: None,
        }
    }

    pub fn with_profile_trigger_delay(mut self, delay: Duration) -> Self {
        self.profile_trigger_delay = delay;
        self
    }

    /// Where confirmation emails should link back to.
    pub fn with_redirect_to(mut self, url: impl Into<String>) -> Self {
        self.redirect_to = Some(url.into());
        self
    }

    /// Register a new member and notify the user of the result.
    pub async fn register(
        &self,
        form: &JoinForm,
        photo: Option<PhotoUpload>,
    ) -> Result<RegisteredUser, RegistrationError> {
        let result = self.submit(form, photo).await;
        match &result {
            Ok(user) => {
                tracing::info!(user_id = %user.user_id, staged = user.staged, "Registration complete");
                self.notifier
                    .notify(Notification::success(
                        "Welcome to BorNet!",
                        "Your account has been created. Please check your email to confirm it.",
                    ))
                    .await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Registration failed");
                self.notifier
                    .notify(Notification::destructive("Registration failed", e.to_string()))
                    .await;
            }
        }
        result
    }

    async fn submit(
        &self,
        form: &JoinForm,
        photo: Option<PhotoUpload>,
    ) -> Result<RegisteredUser, RegistrationError> {
        form.validate()?;

        let user = self
            .auth
            .sign_up(&SignUpRequest {
                email: form.email.trim().to_string(),
                password: form.password.clone(),
                legal_name: form.legal_name.trim().to_string(),
                redirect_to: self.redirect_to.clone(),
            })
            .await?;
        tracing::debug!(user_id = %user.id, "Account created");

        let profile_photo_url = match photo {
            Some(photo) => self.upload_photo(&user.id, photo).await,
            None => None,
        };

        // The profile row is created by a backend trigger on sign-up.
        tokio::time::sleep(self.profile_trigger_delay).await;
        self.backend
            .update_profile(&user.id, &form.profile_update(profile_photo_url.clone()))
            .await?;

        let payload = form.staged_payload(&user.id);
        let staged = payload.has_records();
        if staged {
            stage_payload(self.store.as_ref(), &payload).await?;
        }

        Ok(RegisteredUser {
            user_id: user.id,
            profile_photo_url,
            staged,
        })
    }

    async fn upload_photo(&self, user_id: &str, photo: PhotoUpload) -> Option<String> {
        let path = photo.storage_path(user_id);
        match self
            .photos
            .upload(&path, photo.bytes, &photo.content_type, false)
            .await
        {
            Ok(()) => Some(self.photos.public_url(&path)),
            Err(e) => {
                tracing::warn!(error = %e, path = %path, "Photo upload failed, continuing without it");
                None
            }
        }
    }
}
