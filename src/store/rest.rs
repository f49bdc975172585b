//! HTTP adapter for a PostgREST/GoTrue-shaped backend
//!
//! Owner scoping happens in the query itself (`user_id=eq.` filters on
//! every read and delete), so a caller can never touch another user's
//! rows regardless of what the backend's own row policies add on top.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{HistoryRecord, IdentityVerifier, RecordStore, StoreError, UserId};

/// Connection settings for the history backend
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Base URL of the backend (auth under /auth/v1, data under /rest/v1)
    pub base_url: String,
    /// Service API key, sent as the `apikey` header
    pub api_key: String,
    /// Table holding history rows
    pub table: String,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            table: "history".to_string(),
        }
    }
}

/// Backend client implementing both store seams
pub struct RestStore {
    config: RestConfig,
    client: Client,
}

impl RestStore {
    pub fn new(config: RestConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn auth_url(&self) -> String {
        format!("{}/auth/v1/user", self.config.base_url.trim_end_matches('/'))
    }

    fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.table
        )
    }
}

#[async_trait]
impl IdentityVerifier for RestStore {
    async fn verify(&self, bearer: &str) -> Result<UserId, StoreError> {
        if bearer.is_empty() {
            return Err(StoreError::MissingCredential);
        }

        let response = self
            .client
            .get(self.auth_url())
            .header("apikey", &self.config.api_key)
            .bearer_auth(bearer)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::InvalidCredential(format!(
                "identity provider returned {}",
                response.status()
            )));
        }

        let user: Value = response.json().await?;
        match user["id"].as_str() {
            Some(id) if !id.is_empty() => Ok(UserId(id.to_string())),
            _ => Err(StoreError::InvalidCredential(
                "identity response had no user id".to_string(),
            )),
        }
    }
}

#[async_trait]
impl RecordStore for RestStore {
    async fn insert(&self, record: HistoryRecord) -> Result<(), StoreError> {
        let response = self
            .client
            .post(self.table_url())
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .header("Prefer", "return=minimal")
            .json(&record)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Backend(format!("insert failed: {status}: {body}")));
        }
        Ok(())
    }

    async fn list(
        &self,
        owner: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<HistoryRecord>, StoreError> {
        let mut request = self
            .client
            .get(self.table_url())
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .query(&[
                ("user_id", format!("eq.{}", owner.0)),
                ("order", "created_at.desc".to_string()),
            ]);
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit.to_string())]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Backend(format!("list failed: {status}: {body}")));
        }

        Ok(response.json().await?)
    }

    async fn delete(&self, owner: &UserId, id: &str) -> Result<bool, StoreError> {
        let response = self
            .client
            .delete(self.table_url())
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            // Ask for the deleted rows back so we can tell 0 from 1
            .header("Prefer", "return=representation")
            .query(&[
                ("id", format!("eq.{id}")),
                ("user_id", format!("eq.{}", owner.0)),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Backend(format!("delete failed: {status}: {body}")));
        }

        let deleted: Vec<Value> = response.json().await?;
        Ok(!deleted.is_empty())
    }
}
