//! libSQL staging store: durable key/value slot on the device.
//!
//! Supports a local database file or `:memory:`.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use super::StagingStore;
use super::migrations;
use crate::error::StagingError;

/// libSQL-backed staging store.
///
/// Holds a single connection reused for all operations.
pub struct LibSqlStagingStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlStagingStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, StagingError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StagingError::Open(format!("Failed to create staging directory: {e}"))
                })?;
            }
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StagingError::Open(format!("Failed to open libSQL database: {e}")))?;

        let store = Self::from_database(db).await?;
        info!(path = %path.display(), "Staging store opened");
        Ok(store)
    }

    /// Create an in-memory store (for tests).
    pub async fn new_memory() -> Result<Self, StagingError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StagingError::Open(format!("Failed to create in-memory database: {e}")))?;
        Self::from_database(db).await
    }

    async fn from_database(db: LibSqlDatabase) -> Result<Self, StagingError> {
        let conn = db
            .connect()
            .map_err(|e| StagingError::Open(format!("Failed to create connection: {e}")))?;
        migrations::run_migrations(&conn).await?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }
}

#[async_trait]
impl StagingStore for LibSqlStagingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StagingError> {
        let mut rows = self
            .conn
            .query(
                "SELECT value FROM staging_entries WHERE key = ?1",
                params![key],
            )
            .await
            .map_err(|e| StagingError::Query(format!("get: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let value: String = row
                    .get(0)
                    .map_err(|e| StagingError::Query(format!("get: {e}")))?;
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(StagingError::Query(format!("get: {e}"))),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StagingError> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO staging_entries (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT (key) DO UPDATE SET value = ?2, updated_at = ?3",
                params![key, value, now],
            )
            .await
            .map_err(|e| StagingError::Query(format!("set: {e}")))?;
        debug!(key, "Staging entry written");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StagingError> {
        let count = self
            .conn
            .execute("DELETE FROM staging_entries WHERE key = ?1", params![key])
            .await
            .map_err(|e| StagingError::Query(format!("delete: {e}")))?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_delete_in_memory() {
        let store = LibSqlStagingStore::new_memory().await.unwrap();

        assert!(store.get("pendingProfileData").await.unwrap().is_none());

        store.set("pendingProfileData", "{\"a\":1}").await.unwrap();
        store.set("pendingProfileData", "{\"a\":2}").await.unwrap();
        assert_eq!(
            store.get("pendingProfileData").await.unwrap().as_deref(),
            Some("{\"a\":2}")
        );

        assert!(store.delete("pendingProfileData").await.unwrap());
        assert!(!store.delete("pendingProfileData").await.unwrap());
        assert!(store.get("pendingProfileData").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn entries_survive_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("staging.db");

        {
            let store = LibSqlStagingStore::new_local(&path).await.unwrap();
            store.set("k", "persisted").await.unwrap();
        }
        assert!(path.exists());

        let reopened = LibSqlStagingStore::new_local(&path).await.unwrap();
        assert_eq!(reopened.get("k").await.unwrap().as_deref(), Some("persisted"));
    }
}
