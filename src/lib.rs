//! prompt-compressor - expand prompts into token-dense serializations
//!
//! This library takes a free-text prompt, asks a hosted generative model to
//! expand it into a detailed "super prompt" plus four re-encodings of the
//! same logic (pretty JSON, minified JSON, YAML, TOON), and estimates how
//! many tokens and dollars each re-encoding saves against the markdown
//! baseline.
//!
//! ## Key Pieces
//!
//! - **Optimizer Pipeline**: one call out to the model, defensive JSON
//!   extraction, normalization to the canonical result schema
//! - **Savings Estimator**: pure per-format token/cost/percentage math with
//!   best-format selection
//! - **Store Seams**: `IdentityVerifier` + `RecordStore` traits with REST
//!   and in-memory adapters for per-user history
//! - **HTTP Boundary**: axum router exposing optimize, history and stats

pub mod config;
pub mod http;
pub mod optimizer;
pub mod provider;
pub mod savings;
pub mod stats;
pub mod store;

pub use config::{Config, ConfigBuilder, ConfigError};
pub use http::AppState;
pub use optimizer::{
    Category, Format, OptimizationResult, OptimizeError, OptimizedPrompt, PromptOptimizer,
};
pub use provider::{ExpanderError, GeminiConfig, GeminiExpander, PromptExpander};
pub use savings::{SavingsBreakdown, INPUT_PRICE_PER_MTOK};
pub use stats::DashboardStats;
pub use store::{
    HistoryRecord, IdentityVerifier, MemoryStore, RecordStore, RestConfig, RestStore, StoreError,
    UserId,
};
