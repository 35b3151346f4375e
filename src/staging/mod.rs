//! Device-local staging store, a key/value slot that survives reloads.
//!
//! Registration writes nested profile records here when they cannot be
//! persisted right away; the reconciler drains the slot later.

pub mod libsql_store;
pub mod memory;
mod migrations;
pub mod model;

pub use libsql_store::LibSqlStagingStore;
pub use memory::MemoryStagingStore;
pub use model::{StagedEducation, StagedPayload, StagedWork};

use async_trait::async_trait;

use crate::error::StagingError;

/// Fixed key holding the pending profile payload.
pub const PENDING_PROFILE_DATA_KEY: &str = "pendingProfileData";

/// Key/value storage scoped to the current device.
///
/// Callers assume a single reader/writer at a time; implementations do not
/// coordinate concurrent flows.
#[async_trait]
pub trait StagingStore: Send + Sync {
    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, StagingError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StagingError>;

    /// Remove `key`. Returns whether an entry existed.
    async fn delete(&self, key: &str) -> Result<bool, StagingError>;
}

/// Serialize `payload` into the pending-data slot (last write wins).
pub async fn stage_payload(
    store: &dyn StagingStore,
    payload: &StagedPayload,
) -> Result<(), StagingError> {
    let text = serde_json::to_string(payload)?;
    store.set(PENDING_PROFILE_DATA_KEY, &text).await?;
    tracing::info!(
        education = payload.education.len(),
        work_experience = payload.work_experience.len(),
        "Staged pending profile data"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stage_payload_overwrites_previous_entry() {
        let store = MemoryStagingStore::new();

        let first = StagedPayload {
            education: vec![StagedEducation::new("Bor High School")],
            work_experience: vec![],
            user_id: "first".into(),
        };
        let second = StagedPayload {
            education: vec![],
            work_experience: vec![StagedWork::new("Bor Clinic", "Nurse")],
            user_id: "second".into(),
        };

        stage_payload(&store, &first).await.unwrap();
        stage_payload(&store, &second).await.unwrap();

        let raw = store.get(PENDING_PROFILE_DATA_KEY).await.unwrap().unwrap();
        let stored = StagedPayload::parse(&raw).unwrap();
        assert_eq!(stored, second);
    }
}
