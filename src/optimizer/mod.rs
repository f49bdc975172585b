//! Optimization pipeline: expand, sanitize, normalize, estimate savings

mod result;
mod sanitize;

pub use result::{estimate_tokens, Category, Format, FormatSet, OptimizationResult, ResultStats};
pub use sanitize::extract_json;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::provider::{ExpanderError, PromptExpander};
use crate::savings::{self, SavingsBreakdown};

#[derive(Error, Debug)]
pub enum OptimizeError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("model did not return parseable JSON: {0}")]
    Parse(String),
}

impl From<ExpanderError> for OptimizeError {
    fn from(err: ExpanderError) -> Self {
        match err {
            ExpanderError::MissingKey(msg) => OptimizeError::Config(msg),
            other => OptimizeError::Upstream(other.to_string()),
        }
    }
}

/// A normalized result together with its derived savings figures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizedPrompt {
    #[serde(flatten)]
    pub result: OptimizationResult,
    pub savings: SavingsBreakdown,
}

/// Single-shot optimizer: one call out to the expander, pure computation
/// afterwards. Holds no state between requests and never retries; a failed
/// upstream call surfaces immediately and the caller decides whether to
/// resubmit.
pub struct PromptOptimizer {
    expander: Box<dyn PromptExpander>,
}

impl PromptOptimizer {
    pub fn new(expander: Box<dyn PromptExpander>) -> Self {
        Self { expander }
    }

    /// Runs the full pipeline for one prompt. Persistence is the caller's
    /// side effect, not this method's.
    pub async fn optimize(&self, prompt: &str) -> Result<OptimizedPrompt, OptimizeError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(OptimizeError::InvalidInput(
                "prompt must not be empty".to_string(),
            ));
        }

        let reply = self.expander.expand(prompt).await?;
        debug!(reply_len = reply.len(), "received model reply");

        let json = sanitize::extract_json(&reply)?;
        let raw: result::RawReply =
            serde_json::from_str(&json).map_err(|err| OptimizeError::Parse(err.to_string()))?;

        let result = OptimizationResult::from_reply(prompt, raw);
        let savings = savings::estimate(&result);

        Ok(OptimizedPrompt { result, savings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct CannedExpander {
        reply: String,
    }

    #[async_trait]
    impl PromptExpander for CannedExpander {
        async fn expand(&self, _prompt: &str) -> Result<String, ExpanderError> {
            Ok(self.reply.clone())
        }
    }

    fn optimizer_with(reply: &str) -> PromptOptimizer {
        PromptOptimizer::new(Box::new(CannedExpander {
            reply: reply.to_string(),
        }))
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected_before_network() {
        let optimizer = optimizer_with("{}");
        let err = optimizer.optimize("   ").await.unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_fenced_reply_parses_end_to_end() {
        let reply = format!(
            "```json\n{}\n```",
            serde_json::json!({
                "category": "Content",
                "optimized_markdown": "m".repeat(400),
                "formats": { "toon": "t".repeat(30) }
            })
        );
        let optimizer = optimizer_with(&reply);

        let optimized = optimizer.optimize("Write a sales email").await.unwrap();
        assert_eq!(optimized.result.category, Category::Content);
        assert_eq!(optimized.result.stats.token_counts["markdown"], 100);
        assert_eq!(optimized.savings.best_format, Format::Toon);
    }

    #[tokio::test]
    async fn test_unparseable_reply_is_parse_error() {
        let optimizer = optimizer_with("I am just a language model.");
        let err = optimizer.optimize("hello").await.unwrap_err();
        assert!(matches!(err, OptimizeError::Parse(_)));
        assert!(err.to_string().contains("parseable JSON"));
    }

    #[tokio::test]
    async fn test_missing_key_maps_to_config_error() {
        struct NoKey;
        #[async_trait]
        impl PromptExpander for NoKey {
            async fn expand(&self, _prompt: &str) -> Result<String, ExpanderError> {
                Err(ExpanderError::MissingKey("api key missing".to_string()))
            }
        }

        let optimizer = PromptOptimizer::new(Box::new(NoKey));
        let err = optimizer.optimize("hello").await.unwrap_err();
        assert!(matches!(err, OptimizeError::Config(_)));
    }
}
