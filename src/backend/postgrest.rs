//! PostgREST client for the profile collections, plus photo storage.
//!
//! Tables live under `{url}/rest/v1/<table>`, database functions under
//! `{url}/rest/v1/rpc/<name>`, objects under
//! `{url}/storage/v1/object/<bucket>/<path>`.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use super::model::{
    EducationInsert, EducationRecord, PROFILE_PHOTOS_BUCKET, Profile, ProfileUpdate,
    WorkExperienceInsert, WorkExperienceRecord, rpc, tables,
};
use super::{PhotoStorage, ProfileBackend};
use crate::auth::AccessToken;
use crate::config::BackendConfig;
use crate::error::BackendError;

/// HTTP client for the hosted REST and storage endpoints.
pub struct PostgrestClient {
    base_url: String,
    anon_key: SecretString,
    access_token: AccessToken,
    client: reqwest::Client,
}

impl PostgrestClient {
    pub fn new(config: &BackendConfig, access_token: AccessToken) -> Self {
        Self {
            base_url: config.url.clone(),
            anon_key: config.anon_key.clone(),
            access_token,
            client: reqwest::Client::new(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{function}", self.base_url)
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{PROFILE_PHOTOS_BUCKET}/{}",
            self.base_url,
            path.trim_start_matches('/')
        )
    }

    /// Attach `apikey` and bearer headers. Without a user session the anon
    /// key doubles as the bearer token.
    async fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let anon = self.anon_key.expose_secret();
        let bearer = self
            .access_token
            .get()
            .await
            .unwrap_or_else(|| anon.to_string());
        req.header("apikey", anon).bearer_auth(bearer)
    }

    async fn send(
        &self,
        table: &str,
        req: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, BackendError> {
        let resp = self
            .authorized(req)
            .await
            .send()
            .await
            .map_err(|e| BackendError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Rejected {
                table: table.to_string(),
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        Ok(resp)
    }

    async fn insert_rows<T: serde::Serialize + Sync>(
        &self,
        table: &str,
        rows: &[T],
    ) -> Result<(), BackendError> {
        let req = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=minimal")
            .json(rows);
        self.send(table, req).await?;
        tracing::debug!(table, rows = rows.len(), "Inserted rows");
        Ok(())
    }

    /// Insert one row and read it back, like `.insert(..).select().single()`.
    async fn add_row<T, R>(&self, table: &str, row: &T) -> Result<R, BackendError>
    where
        T: serde::Serialize + Sync,
        R: DeserializeOwned,
    {
        let req = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .header(reqwest::header::ACCEPT, "application/vnd.pgrst.object+json")
            .json(row);
        let resp = self.send(table, req).await?;
        let stored = resp.json().await.map_err(|e| BackendError::InvalidResponse {
            table: table.to_string(),
            reason: e.to_string(),
        })?;
        tracing::debug!(table, "Added row");
        Ok(stored)
    }

    async fn call_rpc<R: DeserializeOwned>(
        &self,
        function: &str,
        args: serde_json::Value,
    ) -> Result<R, BackendError> {
        let req = self.client.post(self.rpc_url(function)).json(&args);
        let resp = self.send(function, req).await?;
        resp.json().await.map_err(|e| BackendError::InvalidResponse {
            table: function.to_string(),
            reason: e.to_string(),
        })
    }

    async fn list_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        user_id: &str,
    ) -> Result<Vec<T>, BackendError> {
        let req = self.client.get(self.table_url(table)).query(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{user_id}")),
            ("order", "created_at.asc".to_string()),
        ]);
        let resp = self.send(table, req).await?;
        resp.json()
            .await
            .map_err(|e| BackendError::InvalidResponse {
                table: table.to_string(),
                reason: e.to_string(),
            })
    }

    async fn delete_row(&self, table: &str, id: &str) -> Result<(), BackendError> {
        let req = self
            .client
            .delete(self.table_url(table))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation");
        let resp = self.send(table, req).await?;
        let deleted: Vec<serde_json::Value> =
            resp.json()
                .await
                .map_err(|e| BackendError::InvalidResponse {
                    table: table.to_string(),
                    reason: e.to_string(),
                })?;
        if deleted.is_empty() {
            return Err(BackendError::NotFound {
                entity: table.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileBackend for PostgrestClient {
    async fn insert_education(&self, records: &[EducationInsert]) -> Result<(), BackendError> {
        self.insert_rows(tables::EDUCATION, records).await
    }

    async fn add_education(
        &self,
        record: &EducationInsert,
    ) -> Result<EducationRecord, BackendError> {
        self.add_row(tables::EDUCATION, record).await
    }

    async fn list_education(&self, user_id: &str) -> Result<Vec<EducationRecord>, BackendError> {
        self.list_rows(tables::EDUCATION, user_id).await
    }

    async fn delete_education(&self, id: &str) -> Result<(), BackendError> {
        self.delete_row(tables::EDUCATION, id).await
    }

    async fn insert_work_experience(
        &self,
        records: &[WorkExperienceInsert],
    ) -> Result<(), BackendError> {
        self.insert_rows(tables::WORK_EXPERIENCE, records).await
    }

    async fn add_work_experience(
        &self,
        record: &WorkExperienceInsert,
    ) -> Result<WorkExperienceRecord, BackendError> {
        self.add_row(tables::WORK_EXPERIENCE, record).await
    }

    async fn list_work_experience(
        &self,
        user_id: &str,
    ) -> Result<Vec<WorkExperienceRecord>, BackendError> {
        self.list_rows(tables::WORK_EXPERIENCE, user_id).await
    }

    async fn delete_work_experience(&self, id: &str) -> Result<(), BackendError> {
        self.delete_row(tables::WORK_EXPERIENCE, id).await
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, BackendError> {
        let rows: Vec<Profile> = self
            .call_rpc(
                rpc::GET_USER_PROFILE,
                serde_json::json!({ "input_user_id": user_id }),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<(), BackendError> {
        let req = self
            .client
            .patch(self.table_url(tables::PROFILES))
            .query(&[("user_id", format!("eq.{user_id}"))])
            .header("Prefer", "return=minimal")
            .json(update);
        self.send(tables::PROFILES, req).await?;
        tracing::info!(user_id, "Profile updated");
        Ok(())
    }

    async fn update_profile_photo(
        &self,
        user_id: &str,
        photo_url: &str,
    ) -> Result<(), BackendError> {
        let updated: bool = self
            .call_rpc(
                rpc::UPDATE_PROFILE_PHOTO,
                serde_json::json!({ "target_user_id": user_id, "photo_url": photo_url }),
            )
            .await?;
        if !updated {
            return Err(BackendError::NotFound {
                entity: tables::PROFILES.to_string(),
                id: user_id.to_string(),
            });
        }
        tracing::info!(user_id, "Profile photo updated");
        Ok(())
    }
}

#[async_trait]
impl PhotoStorage for PostgrestClient {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), BackendError> {
        let size = bytes.len();
        let req = self
            .client
            .post(self.object_url(path))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", upsert.to_string())
            .body(bytes);
        self.send(PROFILE_PHOTOS_BUCKET, req).await?;
        tracing::info!(path, size, upsert, "Photo uploaded");
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{PROFILE_PHOTOS_BUCKET}/{}",
            self.base_url,
            path.trim_start_matches('/')
        )
    }
}

/// Pull a readable message out of a REST error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}
