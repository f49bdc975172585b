//! Caller identity and history persistence seams
//!
//! The optimizer core never talks to a specific backend: it sees the
//! [`IdentityVerifier`] and [`RecordStore`] traits and whatever adapter was
//! injected at startup ([`RestStore`] in production, [`MemoryStore`] for
//! tests and store-less dev runs).

mod memory;
mod rest;

pub use memory::MemoryStore;
pub use rest::{RestConfig, RestStore};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::optimizer::{Category, Format, OptimizationResult};
use crate::savings::SavingsBreakdown;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("missing bearer credential")]
    MissingCredential,

    #[error("invalid bearer credential: {0}")]
    InvalidCredential(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store error: {0}")]
    Backend(String),
}

/// Identity of an authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One persisted optimization, owned by exactly one user.
/// Created once, never updated, deleted explicitly by its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub original_prompt: String,
    pub category: Category,
    /// Markdown baseline token count
    pub tokens_original: u64,
    /// Token count of the best-performing format
    pub tokens_optimized: u64,
    pub best_format: Format,
    pub savings_percentage: String,
    pub cost_savings_usd: f64,
    /// The full normalized result, for re-display
    pub optimized_result: OptimizationResult,
}

impl HistoryRecord {
    /// Builds the record persisted after a successful optimization, using
    /// the best format's figures as the headline savings.
    pub fn new(owner: &UserId, result: &OptimizationResult, savings: &SavingsBreakdown) -> Self {
        let baseline = result
            .stats
            .token_counts
            .get(Format::Markdown.key())
            .copied()
            .unwrap_or(0);
        let best_percentage = savings
            .savings_percentage
            .get(savings.best_format.key())
            .cloned()
            .unwrap_or_else(|| "0%".to_string());

        Self {
            id: generate_record_id(),
            user_id: owner.0.clone(),
            created_at: Utc::now(),
            original_prompt: result.original_prompt.clone(),
            category: result.category,
            tokens_original: baseline,
            tokens_optimized: savings.best_format_tokens,
            best_format: savings.best_format,
            savings_percentage: best_percentage,
            cost_savings_usd: savings.max_savings_usd,
            optimized_result: result.clone(),
        }
    }

    /// Tokens saved by the best format
    pub fn tokens_saved(&self) -> u64 {
        self.tokens_original.saturating_sub(self.tokens_optimized)
    }
}

/// Resolves an opaque bearer credential to an authenticated user
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, bearer: &str) -> Result<UserId, StoreError>;
}

/// Owner-scoped access to history records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts a new record. Records are immutable once written.
    async fn insert(&self, record: HistoryRecord) -> Result<(), StoreError>;

    /// Lists the owner's records, newest first, up to `limit` when given
    async fn list(
        &self,
        owner: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<HistoryRecord>, StoreError>;

    /// Deletes a record if and only if `owner` owns it. Returns whether a
    /// row was affected; a foreign id affects nothing even when it exists.
    async fn delete(&self, owner: &UserId, id: &str) -> Result<bool, StoreError>;
}

/// Random 32-hex-char record id
pub fn generate_record_id() -> String {
    use rand::RngCore;

    let mut bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|byte| format!("{:02x}", byte)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::{FormatSet, ResultStats};
    use crate::savings;
    use std::collections::BTreeMap;

    fn sample_result() -> OptimizationResult {
        let mut token_counts = BTreeMap::new();
        token_counts.insert("markdown".to_string(), 100);
        token_counts.insert("json_pretty".to_string(), 25);
        token_counts.insert("json_minified".to_string(), 15);
        token_counts.insert("yaml".to_string(), 23);
        token_counts.insert("toon".to_string(), 8);

        OptimizationResult {
            category: Category::Content,
            original_prompt: "Write a sales email".to_string(),
            optimized_markdown: "m".repeat(400),
            formats: FormatSet::default(),
            stats: ResultStats {
                original_tokens: 5,
                token_counts,
            },
        }
    }

    #[test]
    fn test_record_uses_best_format_figures() {
        let result = sample_result();
        let breakdown = savings::estimate(&result);
        let record = HistoryRecord::new(&UserId("user-1".to_string()), &result, &breakdown);

        assert_eq!(record.user_id, "user-1");
        assert_eq!(record.tokens_original, 100);
        assert_eq!(record.tokens_optimized, 8);
        assert_eq!(record.best_format, Format::Toon);
        assert_eq!(record.savings_percentage, "92.0%");
        assert_eq!(record.tokens_saved(), 92);
    }

    #[test]
    fn test_record_ids_are_unique_hex() {
        let first = generate_record_id();
        let second = generate_record_id();
        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }
}
