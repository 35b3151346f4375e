//! Actions behind the profile, profile edit and profile photo screens.

use std::sync::Arc;

use crate::auth::SessionOracle;
use crate::backend::{
    EducationRecord, PhotoStorage, Profile, ProfileBackend, ProfileUpdate, WorkExperienceRecord,
};
use crate::error::ProfileError;
use crate::notify::{Notification, Notifier};
use crate::registration::PhotoUpload;

use super::draft::{EducationDraft, WorkDraft};

/// Everything shown on the profile screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileView {
    /// `None` until the sign-up trigger has created the row.
    pub profile: Option<Profile>,
    pub education: Vec<EducationRecord>,
    pub work_experience: Vec<WorkExperienceRecord>,
}

/// Profile operations for whoever is signed in.
pub struct ProfileManager {
    session: Arc<dyn SessionOracle>,
    backend: Arc<dyn ProfileBackend>,
    photos: Arc<dyn PhotoStorage>,
    notifier: Arc<dyn Notifier>,
}

impl ProfileManager {
    pub fn new(
        session: Arc<dyn SessionOracle>,
        backend: Arc<dyn ProfileBackend>,
        photos: Arc<dyn PhotoStorage>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            session,
            backend,
            photos,
            notifier,
        }
    }

    async fn user_id(&self) -> Result<String, ProfileError> {
        match self.session.current_user().await? {
            Some(user) => Ok(user.id),
            None => Err(ProfileError::NotSignedIn),
        }
    }

    /// Load the profile and both record lists.
    pub async fn load(&self) -> Result<ProfileView, ProfileError> {
        let user_id = self.user_id().await?;
        let profile = self.backend.get_profile(&user_id).await?;
        let education = self.backend.list_education(&user_id).await?;
        let work_experience = self.backend.list_work_experience(&user_id).await?;
        tracing::debug!(
            user_id = %user_id,
            found = profile.is_some(),
            education = education.len(),
            work_experience = work_experience.len(),
            "Profile loaded"
        );
        Ok(ProfileView {
            profile,
            education,
            work_experience,
        })
    }

    /// Save edited profile fields. The photo is left as is unless set.
    pub async fn save(&self, update: &ProfileUpdate) -> Result<(), ProfileError> {
        let result = async {
            let user_id = self.user_id().await?;
            self.backend.update_profile(&user_id, update).await?;
            Ok::<_, ProfileError>(())
        }
        .await;
        self.report(
            result,
            ("Profile updated", "Your profile has been successfully updated."),
            "Error updating profile",
        )
        .await
    }

    /// Replace the profile photo and point the profile at it.
    pub async fn replace_photo(&self, photo: PhotoUpload) -> Result<String, ProfileError> {
        let result = async move {
            let user_id = self.user_id().await?;
            let path = photo.storage_path(&user_id);
            self.photos
                .upload(&path, photo.bytes, &photo.content_type, true)
                .await?;
            let url = self.photos.public_url(&path);
            self.backend.update_profile_photo(&user_id, &url).await?;
            Ok::<_, ProfileError>(url)
        }
        .await;
        self.report(
            result,
            ("Photo updated", "Your profile photo has been successfully updated."),
            "Error uploading photo",
        )
        .await
    }

    pub async fn add_education(
        &self,
        draft: &EducationDraft,
    ) -> Result<EducationRecord, ProfileError> {
        let result = async {
            draft.validate()?;
            let user_id = self.user_id().await?;
            let stored = self.backend.add_education(&draft.to_insert(&user_id)).await?;
            Ok::<_, ProfileError>(stored)
        }
        .await;
        self.report(
            result,
            ("Education added", "Your education entry has been added successfully."),
            "Error adding education",
        )
        .await
    }

    pub async fn delete_education(&self, id: &str) -> Result<(), ProfileError> {
        let result = self.backend.delete_education(id).await.map_err(Into::into);
        self.report(
            result,
            ("Education deleted", "Your education entry has been deleted."),
            "Error deleting education",
        )
        .await
    }

    pub async fn add_work_experience(
        &self,
        draft: &WorkDraft,
    ) -> Result<WorkExperienceRecord, ProfileError> {
        let result = async {
            draft.validate()?;
            let user_id = self.user_id().await?;
            let stored = self
                .backend
                .add_work_experience(&draft.to_insert(&user_id))
                .await?;
            Ok::<_, ProfileError>(stored)
        }
        .await;
        self.report(
            result,
            (
                "Work experience added",
                "Your work experience entry has been added successfully.",
            ),
            "Error adding work experience",
        )
        .await
    }

    pub async fn delete_work_experience(&self, id: &str) -> Result<(), ProfileError> {
        let result = self
            .backend
            .delete_work_experience(id)
            .await
            .map_err(Into::into);
        self.report(
            result,
            (
                "Work experience deleted",
                "Your work experience entry has been deleted.",
            ),
            "Error deleting work experience",
        )
        .await
    }

    /// Notify the outcome of an action. Incomplete drafts are rejected quietly.
    async fn report<T>(
        &self,
        result: Result<T, ProfileError>,
        (title, description): (&str, &str),
        failure: &str,
    ) -> Result<T, ProfileError> {
        match &result {
            Ok(_) => {
                self.notifier
                    .notify(Notification::success(title, description))
                    .await
            }
            Err(ProfileError::Invalid(e)) => tracing::debug!(error = %e, "Draft incomplete"),
            Err(e) => {
                tracing::warn!(error = %e, action = failure, "Profile action failed");
                self.notifier
                    .notify(Notification::destructive(failure, e.to_string()))
                    .await
            }
        }
        result
    }
}
