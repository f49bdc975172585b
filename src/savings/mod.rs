//! Cost and percentage savings relative to the markdown baseline
//!
//! Pure computation: deterministic for a given [`OptimizationResult`],
//! no I/O, no randomness.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::optimizer::{estimate_tokens, Format, OptimizationResult};

/// Price per one million input tokens, in USD
pub const INPUT_PRICE_PER_MTOK: f64 = 0.10;

/// Derived savings figures for one optimization result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsBreakdown {
    /// Dollars saved per format versus sending the markdown form
    pub cost_savings_usd: BTreeMap<String, f64>,
    /// Percentage saved per format, `"12.5%"` style; `"0%"` across the
    /// board when the baseline itself is zero
    pub savings_percentage: BTreeMap<String, String>,
    /// Format with the strictly greatest cost saving. Markdown, at zero
    /// savings, when nothing beats the baseline.
    pub best_format: Format,
    pub best_format_tokens: u64,
    pub max_savings_usd: f64,
}

/// Dollar savings for a format against the baseline. Never negative;
/// a format that costs more than the baseline simply saves nothing.
pub fn cost_savings(tokens: u64, baseline: u64) -> f64 {
    baseline.saturating_sub(tokens) as f64 / 1_000_000.0 * INPUT_PRICE_PER_MTOK
}

fn percentage(diff: u64, baseline: u64) -> String {
    if baseline == 0 {
        // Division-by-zero guard, not an error
        "0%".to_string()
    } else {
        format!("{:.1}%", diff as f64 / baseline as f64 * 100.0)
    }
}

fn token_count(result: &OptimizationResult, format: Format) -> u64 {
    match result.stats.token_counts.get(format.key()) {
        Some(&count) if count > 0 => count,
        _ => estimate_tokens(result.content(format)),
    }
}

/// Computes the full savings breakdown for a result.
///
/// The markdown token count is the 100% baseline; its own saved-token
/// value is 0 by definition. Every other format is compared against it in
/// the fixed [`Format::ALTERNATES`] order, and ties keep the earlier
/// format.
pub fn estimate(result: &OptimizationResult) -> SavingsBreakdown {
    let baseline = token_count(result, Format::Markdown);

    let mut cost_savings_usd = BTreeMap::new();
    let mut savings_percentage = BTreeMap::new();
    cost_savings_usd.insert(Format::Markdown.key().to_string(), 0.0);
    savings_percentage.insert(Format::Markdown.key().to_string(), percentage(0, baseline));

    let mut best = (Format::Markdown, baseline, 0.0_f64);
    for format in Format::ALTERNATES {
        let tokens = token_count(result, format);
        let diff = baseline.saturating_sub(tokens);
        let cost = cost_savings(tokens, baseline);

        cost_savings_usd.insert(format.key().to_string(), cost);
        savings_percentage.insert(format.key().to_string(), percentage(diff, baseline));

        if cost > best.2 {
            best = (format, tokens, cost);
        }
    }

    SavingsBreakdown {
        cost_savings_usd,
        savings_percentage,
        best_format: best.0,
        best_format_tokens: best.1,
        max_savings_usd: best.2,
    }
}
