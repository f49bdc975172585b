//! In-process record store for tests and store-less serving

use std::sync::Mutex;

use async_trait::async_trait;

use super::{HistoryRecord, IdentityVerifier, RecordStore, StoreError, UserId};

/// Keeps records in memory. As an identity verifier it treats every
/// non-empty bearer token as its own user id, which is enough for local
/// development and the integration tests.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<HistoryRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("store mutex poisoned".to_string())
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert(&self, record: HistoryRecord) -> Result<(), StoreError> {
        self.records.lock().map_err(|_| poisoned())?.push(record);
        Ok(())
    }

    async fn list(
        &self,
        owner: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<HistoryRecord>, StoreError> {
        let records = self.records.lock().map_err(|_| poisoned())?;
        let mut owned: Vec<HistoryRecord> = records
            .iter()
            .filter(|record| record.user_id == owner.0)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = limit {
            owned.truncate(limit);
        }
        Ok(owned)
    }

    async fn delete(&self, owner: &UserId, id: &str) -> Result<bool, StoreError> {
        let mut records = self.records.lock().map_err(|_| poisoned())?;
        let before = records.len();
        records.retain(|record| !(record.id == id && record.user_id == owner.0));
        Ok(records.len() < before)
    }
}

#[async_trait]
impl IdentityVerifier for MemoryStore {
    async fn verify(&self, bearer: &str) -> Result<UserId, StoreError> {
        if bearer.is_empty() {
            return Err(StoreError::MissingCredential);
        }
        Ok(UserId(bearer.to_string()))
    }
}
