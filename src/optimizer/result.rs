//! Normalized optimization results and raw model-reply parsing

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Serialization formats produced for every optimized prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// The readable super prompt, always the savings baseline
    Markdown,
    /// Verbose structured JSON
    JsonPretty,
    /// Minified JSON
    JsonMinified,
    /// Whitespace-sensitive YAML
    Yaml,
    /// Dense pipe-separated notation with short keys
    Toon,
}

impl Format {
    /// Non-baseline formats, in the order savings are evaluated.
    /// Ties during best-format selection keep the earlier entry.
    pub const ALTERNATES: [Format; 4] = [
        Format::JsonPretty,
        Format::JsonMinified,
        Format::Yaml,
        Format::Toon,
    ];

    /// Wire key used in `token_counts` and savings maps
    pub fn key(&self) -> &'static str {
        match self {
            Format::Markdown => "markdown",
            Format::JsonPretty => "json_pretty",
            Format::JsonMinified => "json_minified",
            Format::Yaml => "yaml",
            Format::Toon => "toon",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Fixed category labels the model classifies prompts into
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Coding,
    Content,
    Business,
    Academic,
    Data,
    Personal,
    #[default]
    General,
}

impl Category {
    /// Maps a model-supplied label onto the fixed set. Anything the model
    /// invents (or omits) becomes `General`.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Coding" => Category::Coding,
            "Content" => Category::Content,
            "Business" => Category::Business,
            "Academic" => Category::Academic,
            "Data" => Category::Data,
            "Personal" => Category::Personal,
            _ => Category::General,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Coding => "Coding",
            Category::Content => "Content",
            Category::Business => "Business",
            Category::Academic => "Academic",
            Category::Data => "Data",
            Category::Personal => "Personal",
            Category::General => "General",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four re-encodings of the super prompt. Fields the model left out
/// stay empty strings; that alone is never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatSet {
    pub json_pretty: String,
    pub json_minified: String,
    pub yaml: String,
    pub toon: String,
}

/// Token statistics attached to a result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultStats {
    /// Tokens in the caller's original prompt
    pub original_tokens: u64,
    /// Per-format token counts, keyed by [`Format::key`]. The `markdown`
    /// entry is always present and serves as the savings baseline.
    pub token_counts: BTreeMap<String, u64>,
}

/// One LLM round-trip's output, normalized to the canonical schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub category: Category,
    /// Verbatim user input, never the model's echo
    pub original_prompt: String,
    /// The expanded super prompt, baseline for every savings figure
    pub optimized_markdown: String,
    pub formats: FormatSet,
    pub stats: ResultStats,
}

impl OptimizationResult {
    /// Content of a format as produced by the model
    pub fn content(&self, format: Format) -> &str {
        match format {
            Format::Markdown => &self.optimized_markdown,
            Format::JsonPretty => &self.formats.json_pretty,
            Format::JsonMinified => &self.formats.json_minified,
            Format::Yaml => &self.formats.yaml,
            Format::Toon => &self.formats.toon,
        }
    }

    /// Normalizes a parsed reply: the caller's prompt wins over the model's
    /// echo, unknown categories collapse to General, and every token count
    /// missing or zero in the reply is re-estimated from content length.
    pub(crate) fn from_reply(prompt: &str, reply: RawReply) -> Self {
        let supplied = reply.stats.token_counts;

        let mut result = OptimizationResult {
            category: Category::from_label(&reply.category),
            original_prompt: prompt.to_string(),
            optimized_markdown: reply.optimized_markdown,
            formats: reply.formats,
            stats: ResultStats {
                original_tokens: if reply.stats.original_tokens > 0 {
                    reply.stats.original_tokens
                } else {
                    estimate_tokens(prompt)
                },
                token_counts: BTreeMap::new(),
            },
        };

        let all_formats = [
            Format::Markdown,
            Format::JsonPretty,
            Format::JsonMinified,
            Format::Yaml,
            Format::Toon,
        ];
        for format in all_formats {
            let tokens = match supplied.get(format.key()) {
                Some(&count) if count > 0 => count,
                _ => estimate_tokens(result.content(format)),
            };
            result.stats.token_counts.insert(format.key().to_string(), tokens);
        }

        result
    }
}

/// Heuristic token estimate: roughly 4 characters per token, rounded up
pub fn estimate_tokens(text: &str) -> u64 {
    (text.len() as u64).div_ceil(4)
}

/// Reply shape as the model emits it. Every field is optional; older
/// schema variants with extra stats keys are tolerated and ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawReply {
    pub category: String,
    #[allow(dead_code)]
    pub original_prompt: String,
    pub optimized_markdown: String,
    pub formats: FormatSet,
    pub stats: RawStats,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawStats {
    pub original_tokens: u64,
    pub token_counts: BTreeMap<String, u64>,
}
