//! Generative-AI provider abstraction

mod gemini;

pub use gemini::{GeminiConfig, GeminiExpander};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExpanderError {
    #[error("missing API key: {0}")]
    MissingKey(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("empty reply from model")]
    EmptyReply,
}

/// Trait for text-generation providers that expand prompts.
///
/// Implementations send one request per call and return the model's raw
/// reply text; parsing and normalization stay with the optimizer.
#[async_trait]
pub trait PromptExpander: Send + Sync {
    async fn expand(&self, prompt: &str) -> Result<String, ExpanderError>;
}
