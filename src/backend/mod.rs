//! Hosted backend collections: education, work experience, profiles, photos.

pub mod memory;
pub mod model;
pub mod postgrest;

pub use memory::MemoryBackend;
pub use model::{
    EducationInsert, EducationRecord, Profile, ProfileUpdate, WorkExperienceInsert,
    WorkExperienceRecord, parse_year,
};
pub use postgrest::PostgrestClient;

use async_trait::async_trait;

use crate::error::BackendError;

/// CRUD surface of the profile-related collections.
#[async_trait]
pub trait ProfileBackend: Send + Sync {
    // ── Education ───────────────────────────────────────────────────

    /// Insert all records in one batch.
    async fn insert_education(&self, records: &[EducationInsert]) -> Result<(), BackendError>;

    /// Insert one record and return it as stored.
    async fn add_education(&self, record: &EducationInsert)
    -> Result<EducationRecord, BackendError>;

    async fn list_education(&self, user_id: &str) -> Result<Vec<EducationRecord>, BackendError>;

    async fn delete_education(&self, id: &str) -> Result<(), BackendError>;

    // ── Work experience ─────────────────────────────────────────────

    /// Insert all records in one batch.
    async fn insert_work_experience(
        &self,
        records: &[WorkExperienceInsert],
    ) -> Result<(), BackendError>;

    /// Insert one record and return it as stored.
    async fn add_work_experience(
        &self,
        record: &WorkExperienceInsert,
    ) -> Result<WorkExperienceRecord, BackendError>;

    async fn list_work_experience(
        &self,
        user_id: &str,
    ) -> Result<Vec<WorkExperienceRecord>, BackendError>;

    async fn delete_work_experience(&self, id: &str) -> Result<(), BackendError>;

    // ── Profiles ────────────────────────────────────────────────────

    /// Profile of `user_id`, or `None` when no row exists yet.
    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, BackendError>;

    /// Update the profile row owned by `user_id`.
    async fn update_profile(&self, user_id: &str, update: &ProfileUpdate)
    -> Result<(), BackendError>;

    /// Point the profile of `user_id` at a new photo.
    async fn update_profile_photo(&self, user_id: &str, photo_url: &str)
    -> Result<(), BackendError>;
}

/// File storage for profile photos.
#[async_trait]
pub trait PhotoStorage: Send + Sync {
    /// Upload `bytes` to `path` inside the profile-photos bucket. Without
    /// `upsert`, an existing object at `path` is an error.
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), BackendError>;

    /// Public URL for an uploaded object.
    fn public_url(&self, path: &str) -> String;
}
