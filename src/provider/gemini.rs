//! Gemini generateContent provider

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{ExpanderError, PromptExpander};

/// Fixed instruction sent with every optimization request. The model is
/// asked for the canonical schema: `category` plus a `token_counts` map.
const SYSTEM_INSTRUCTION: &str = r#"You are an expert Prompt Engineer and data compressor.

YOUR TASK:
1. Analyze the user's request and expand it into a "Super Prompt": highly detailed, persona-based, chain-of-thought enabled, written in Markdown.
2. Translate the same prompt logic into four serializations optimized for token density:
   - json_pretty: verbose structured JSON
   - json_minified: the same JSON minified
   - yaml: clean, whitespace-sensitive YAML
   - toon: an extremely dense notation using pipes '|' and short keys while keeping semantic meaning
3. Classify the request into exactly one category: Coding, Content, Business, Academic, Data, Personal or General.

RETURN ONLY RAW JSON. NO MARKDOWN BLOCK.
Structure:
{
  "category": "General",
  "original_prompt": "user input",
  "optimized_markdown": "the detailed super prompt",
  "formats": {
    "json_pretty": "...",
    "json_minified": "...",
    "yaml": "...",
    "toon": "..."
  },
  "stats": {
    "original_tokens": 0,
    "token_counts": {
      "markdown": 0,
      "json_pretty": 0,
      "json_minified": 0,
      "yaml": 0,
      "toon": 0
    }
  }
}"#;

/// Gemini-specific configuration
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key passed as the `key` query parameter
    pub api_key: String,
    /// Base URL (default: https://generativelanguage.googleapis.com/v1beta)
    pub base_url: String,
    /// Model to use (e.g., "gemini-1.5-flash")
    pub model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash".to_string(),
        }
    }
}

/// Gemini provider speaking the generateContent API
pub struct GeminiExpander {
    config: GeminiConfig,
    client: Client,
}

impl GeminiExpander {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn build_request(&self, prompt: &str) -> Value {
        json!({
            "systemInstruction": {
                "parts": [{ "text": SYSTEM_INSTRUCTION }]
            },
            "contents": [{
                "parts": [{ "text": format!("User Input: {prompt}") }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json"
            }
        })
    }

    fn extract_text(json: &Value) -> Option<String> {
        json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
    }
}

#[async_trait]
impl PromptExpander for GeminiExpander {
    async fn expand(&self, prompt: &str) -> Result<String, ExpanderError> {
        // Fail fast before any network I/O
        if self.config.api_key.is_empty() {
            return Err(ExpanderError::MissingKey(
                "gemini.api_key is not configured (set GEMINI_API_KEY)".to_string(),
            ));
        }

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&self.build_request(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Upstream body is diagnostic text only, never trusted as data
            let body = response.text().await.unwrap_or_default();
            return Err(ExpanderError::Provider(format!("{status}: {body}")));
        }

        let json: Value = response.json().await?;
        Self::extract_text(&json).ok_or(ExpanderError::EmptyReply)
    }
}
