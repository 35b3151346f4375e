//! Schema versions for the staging database.
//!
//! Applied steps are recorded in `schema_versions`; opening a store applies
//! whatever is newer than the recorded maximum, in order.

use libsql::Connection;

use crate::error::StagingError;

struct Step {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// Append only.
static STEPS: &[Step] = &[Step {
    version: 1,
    name: "staging_entries",
    sql: "CREATE TABLE IF NOT EXISTS staging_entries (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL,
              updated_at TEXT NOT NULL
          );",
}];

/// Bring the schema up to the latest version.
pub async fn run_migrations(conn: &Connection) -> Result<(), StagingError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_versions (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )
    .await
    .map_err(|e| StagingError::Migration(format!("schema_versions: {e}")))?;

    let applied = schema_version(conn).await?;
    for step in STEPS.iter().filter(|s| s.version > applied) {
        tracing::info!(version = step.version, name = step.name, "Upgrading staging schema");
        conn.execute_batch(step.sql)
            .await
            .map_err(|e| StagingError::Migration(format!("V{} {}: {e}", step.version, step.name)))?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_versions (version, name) VALUES (?1, ?2)",
            libsql::params![step.version, step.name],
        )
        .await
        .map_err(|e| StagingError::Migration(format!("record V{}: {e}", step.version)))?;
    }
    Ok(())
}

/// Highest applied version; 0 on a fresh database.
async fn schema_version(conn: &Connection) -> Result<i64, StagingError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_versions", ())
        .await
        .map_err(|e| StagingError::Migration(format!("read version: {e}")))?;

    match rows.next().await {
        Ok(Some(row)) => row
            .get::<i64>(0)
            .map_err(|e| StagingError::Migration(format!("read version: {e}"))),
        Ok(None) => Ok(0),
        Err(e) => Err(StagingError::Migration(format!("read version: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_conn() -> Connection {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .unwrap();
        db.connect().unwrap()
    }

    #[tokio::test]
    async fn creates_staging_table() {
        let conn = test_conn().await;
        run_migrations(&conn).await.unwrap();

        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='staging_entries'",
                (),
            )
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let count: i64 = row.get(0).unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let conn = test_conn().await;
        run_migrations(&conn).await.unwrap();
        run_migrations(&conn).await.unwrap();

        let version = schema_version(&conn).await.unwrap();
        assert_eq!(version, 1);
    }

    #[tokio::test]
    async fn applied_steps_are_recorded() {
        let conn = test_conn().await;
        run_migrations(&conn).await.unwrap();

        let mut rows = conn
            .query("SELECT version, name FROM schema_versions ORDER BY version", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<i64>(0).unwrap(), 1);
        assert_eq!(row.get::<String>(1).unwrap(), "staging_entries");
        assert!(rows.next().await.unwrap().is_none());
    }
}
