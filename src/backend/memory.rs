//! In-process backend: tables held in memory, with failure injection.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::model::{
    EducationInsert, EducationRecord, PROFILE_PHOTOS_BUCKET, Profile, ProfileUpdate,
    WorkExperienceInsert, WorkExperienceRecord, tables,
};
use super::{PhotoStorage, ProfileBackend};
use crate::error::BackendError;

#[derive(Debug, Default)]
struct Tables {
    education: Vec<EducationRecord>,
    work_experience: Vec<WorkExperienceRecord>,
    /// Profile rows keyed by owner.
    profiles: HashMap<String, Profile>,
    photos: HashMap<String, (String, Vec<u8>)>,
    /// Number of batch insert calls per table.
    insert_calls: HashMap<&'static str, usize>,
    /// Tables whose next writes fail, with the message to report.
    failing: HashMap<&'static str, String>,
}

/// Backend held in memory. Writes to a table can be made to fail.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: RwLock<Tables>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write to `table` fail with `message` until cleared.
    pub async fn fail_table(&self, table: &'static str, message: impl Into<String>) {
        self.tables
            .write()
            .await
            .failing
            .insert(table, message.into());
    }

    pub async fn clear_failures(&self) {
        self.tables.write().await.failing.clear();
    }

    /// All education rows, in insert order.
    pub async fn education(&self) -> Vec<EducationRecord> {
        self.tables.read().await.education.clone()
    }

    /// All work-experience rows, in insert order.
    pub async fn work_experience(&self) -> Vec<WorkExperienceRecord> {
        self.tables.read().await.work_experience.clone()
    }

    pub async fn profile(&self, user_id: &str) -> Option<Profile> {
        self.tables.read().await.profiles.get(user_id).cloned()
    }

    /// Content type and bytes of an uploaded photo.
    pub async fn photo(&self, path: &str) -> Option<(String, Vec<u8>)> {
        self.tables.read().await.photos.get(path).cloned()
    }

    /// Number of batch insert calls made against `table`, failed or not.
    pub async fn insert_calls(&self, table: &str) -> usize {
        self.tables
            .read()
            .await
            .insert_calls
            .get(table)
            .copied()
            .unwrap_or(0)
    }

    /// Total write attempts across both record collections.
    pub async fn total_insert_calls(&self) -> usize {
        self.tables.read().await.insert_calls.values().sum()
    }
}

impl Tables {
    fn check(&self, table: &str) -> Result<(), BackendError> {
        match self.failing.get(table) {
            Some(message) => Err(BackendError::Rejected {
                table: table.to_string(),
                status: 500,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn count_insert(&mut self, table: &'static str) {
        *self.insert_calls.entry(table).or_default() += 1;
    }

    fn store_education(&mut self, insert: &EducationInsert) -> EducationRecord {
        let now = Utc::now();
        let record = EducationRecord {
            id: Uuid::new_v4().to_string(),
            user_id: insert.user_id.clone(),
            institution: insert.institution.clone(),
            field_of_study: insert.field_of_study.clone(),
            degree: insert.degree.clone(),
            start_year: insert.start_year,
            end_year: insert.end_year,
            created_at: now,
            updated_at: now,
        };
        self.education.push(record.clone());
        record
    }

    fn store_work(&mut self, insert: &WorkExperienceInsert) -> WorkExperienceRecord {
        let now = Utc::now();
        let record = WorkExperienceRecord {
            id: Uuid::new_v4().to_string(),
            user_id: insert.user_id.clone(),
            company: insert.company.clone(),
            position: insert.position.clone(),
            description: insert.description.clone(),
            start_year: insert.start_year,
            end_year: insert.end_year,
            created_at: now,
            updated_at: now,
        };
        self.work_experience.push(record.clone());
        record
    }
}

#[async_trait]
impl ProfileBackend for MemoryBackend {
    async fn insert_education(&self, records: &[EducationInsert]) -> Result<(), BackendError> {
        let mut db = self.tables.write().await;
        db.count_insert(tables::EDUCATION);
        db.check(tables::EDUCATION)?;
        for record in records {
            db.store_education(record);
        }
        Ok(())
    }

    async fn add_education(
        &self,
        record: &EducationInsert,
    ) -> Result<EducationRecord, BackendError> {
        let mut db = self.tables.write().await;
        db.count_insert(tables::EDUCATION);
        db.check(tables::EDUCATION)?;
        Ok(db.store_education(record))
    }

    async fn list_education(&self, user_id: &str) -> Result<Vec<EducationRecord>, BackendError> {
        let db = self.tables.read().await;
        Ok(db
            .education
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_education(&self, id: &str) -> Result<(), BackendError> {
        let mut db = self.tables.write().await;
        db.check(tables::EDUCATION)?;
        let before = db.education.len();
        db.education.retain(|r| r.id != id);
        if db.education.len() == before {
            return Err(BackendError::NotFound {
                entity: tables::EDUCATION.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn insert_work_experience(
        &self,
        records: &[WorkExperienceInsert],
    ) -> Result<(), BackendError> {
        let mut db = self.tables.write().await;
        db.count_insert(tables::WORK_EXPERIENCE);
        db.check(tables::WORK_EXPERIENCE)?;
        for record in records {
            db.store_work(record);
        }
        Ok(())
    }

    async fn add_work_experience(
        &self,
        record: &WorkExperienceInsert,
    ) -> Result<WorkExperienceRecord, BackendError> {
        let mut db = self.tables.write().await;
        db.count_insert(tables::WORK_EXPERIENCE);
        db.check(tables::WORK_EXPERIENCE)?;
        Ok(db.store_work(record))
    }

    async fn list_work_experience(
        &self,
        user_id: &str,
    ) -> Result<Vec<WorkExperienceRecord>, BackendError> {
        let db = self.tables.read().await;
        Ok(db
            .work_experience
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_work_experience(&self, id: &str) -> Result<(), BackendError> {
        let mut db = self.tables.write().await;
        db.check(tables::WORK_EXPERIENCE)?;
        let before = db.work_experience.len();
        db.work_experience.retain(|r| r.id != id);
        if db.work_experience.len() == before {
            return Err(BackendError::NotFound {
                entity: tables::WORK_EXPERIENCE.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<(), BackendError> {
        let mut db = self.tables.write().await;
        db.check(tables::PROFILES)?;

        // Sign-up creates the row server-side; here the first update does.
        let now = Utc::now();
        let profile = db
            .profiles
            .entry(user_id.to_string())
            .or_insert_with(|| Profile {
                id: Uuid::new_v4().to_string(),
                legal_name: String::new(),
                age: None,
                email: None,
                phone: None,
                payam: None,
                bio: None,
                skills: None,
                profile_photo_url: None,
                created_at: now,
                updated_at: now,
            });
        profile.legal_name = update.legal_name.clone();
        profile.age = Some(i32::from(update.age));
        profile.payam = Some(update.payam.clone());
        profile.phone = update.phone.clone();
        profile.bio = update.bio.clone();
        profile.skills = Some(update.skills.clone());
        if let Some(url) = &update.profile_photo_url {
            profile.profile_photo_url = Some(url.clone());
        }
        profile.updated_at = now;
        Ok(())
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, BackendError> {
        let db = self.tables.read().await;
        db.check(tables::PROFILES)?;
        Ok(db.profiles.get(user_id).cloned())
    }

    async fn update_profile_photo(
        &self,
        user_id: &str,
        photo_url: &str,
    ) -> Result<(), BackendError> {
        let mut db = self.tables.write().await;
        db.check(tables::PROFILES)?;
        match db.profiles.get_mut(user_id) {
            Some(profile) => {
                profile.profile_photo_url = Some(photo_url.to_string());
                profile.updated_at = Utc::now();
                Ok(())
            }
            None => Err(BackendError::NotFound {
                entity: tables::PROFILES.to_string(),
                id: user_id.to_string(),
            }),
        }
    }
}

#[async_trait]
impl PhotoStorage for MemoryBackend {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), BackendError> {
        let mut db = self.tables.write().await;
        db.check(PROFILE_PHOTOS_BUCKET)?;
        if !upsert && db.photos.contains_key(path) {
            return Err(BackendError::Rejected {
                table: PROFILE_PHOTOS_BUCKET.to_string(),
                status: 409,
                message: "The resource already exists".to_string(),
            });
        }
        db.photos
            .insert(path.to_string(), (content_type.to_string(), bytes));
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("memory://{PROFILE_PHOTOS_BUCKET}/{path}")
    }
}
