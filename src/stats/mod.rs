//! Dashboard aggregates computed over a user's history records

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::optimizer::{Category, Format};
use crate::store::HistoryRecord;

/// How many recent optimizations the dashboard shows
const RECENT_LIMIT: usize = 5;
/// How many daily usage buckets the chart keeps
const USAGE_DAYS: usize = 7;

/// Aggregated dashboard view of one user's history
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_prompts: u64,
    pub total_token_savings: u64,
    pub total_cost_saved_usd: f64,
    pub recent_optimizations: Vec<RecentOptimization>,
    /// Prompts per day for the last seven active days, oldest first
    pub usage_by_day: Vec<DayCount>,
    /// Prompt counts per category, largest first
    pub category_counts: Vec<NamedCount>,
    /// Aggregate generated tokens per format family
    pub format_distribution: Vec<NamedCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentOptimization {
    pub id: String,
    pub prompt: String,
    pub format: Format,
    pub saved: u64,
    pub time: DateTime<Utc>,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub name: String,
    pub prompts: u64,
}

/// Rolls a user's records up into dashboard figures. Pure computation;
/// fetching the records is the caller's concern.
pub fn aggregate(records: &[HistoryRecord]) -> DashboardStats {
    let mut total_token_savings = 0u64;
    let mut total_cost_saved_usd = 0.0f64;
    let mut by_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    let mut by_category: BTreeMap<Category, u64> = BTreeMap::new();
    let mut distribution: BTreeMap<&'static str, u64> = BTreeMap::new();
    for label in ["Markdown", "JSON", "YAML", "TOON"] {
        distribution.insert(label, 0);
    }

    for record in records {
        total_token_savings += record.tokens_saved();
        total_cost_saved_usd += record.cost_savings_usd;

        *by_day.entry(record.created_at.date_naive()).or_default() += 1;
        *by_category.entry(record.category).or_default() += 1;

        let counts = &record.optimized_result.stats.token_counts;
        let bucket = |format: Format| counts.get(format.key()).copied().unwrap_or(0);
        *distribution.entry("Markdown").or_default() += bucket(Format::Markdown);
        *distribution.entry("JSON").or_default() += bucket(Format::JsonPretty);
        *distribution.entry("YAML").or_default() += bucket(Format::Yaml);
        *distribution.entry("TOON").or_default() += bucket(Format::Toon);
    }

    let mut sorted: Vec<&HistoryRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let recent_optimizations = sorted
        .iter()
        .take(RECENT_LIMIT)
        .map(|record| RecentOptimization {
            id: record.id.clone(),
            prompt: record.original_prompt.clone(),
            format: record.best_format,
            saved: record.tokens_saved(),
            time: record.created_at,
            category: record.category,
        })
        .collect();

    let day_count = by_day.len();
    let usage_by_day = by_day
        .into_iter()
        .skip(day_count.saturating_sub(USAGE_DAYS))
        .map(|(date, prompts)| DayCount {
            name: date.format("%b %-d").to_string(),
            prompts,
        })
        .collect();

    let mut category_counts: Vec<NamedCount> = by_category
        .into_iter()
        .map(|(category, value)| NamedCount {
            name: category.as_str().to_string(),
            value,
        })
        .collect();
    category_counts.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));

    let format_distribution = ["Markdown", "JSON", "YAML", "TOON"]
        .iter()
        .map(|label| NamedCount {
            name: label.to_string(),
            value: distribution[label],
        })
        .collect();

    DashboardStats {
        total_prompts: records.len() as u64,
        total_token_savings,
        total_cost_saved_usd,
        recent_optimizations,
        usage_by_day,
        category_counts,
        format_distribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::{FormatSet, OptimizationResult, ResultStats};
    use chrono::Duration;
    use std::collections::BTreeMap;

    fn record(id: &str, category: Category, age_days: i64, saved: u64) -> HistoryRecord {
        let mut token_counts = BTreeMap::new();
        token_counts.insert("markdown".to_string(), 100);
        token_counts.insert("json_pretty".to_string(), 25);
        token_counts.insert("yaml".to_string(), 23);
        token_counts.insert("toon".to_string(), 8);

        HistoryRecord {
            id: id.to_string(),
            user_id: "alice".to_string(),
            created_at: Utc::now() - Duration::days(age_days),
            original_prompt: format!("prompt {id}"),
            category,
            tokens_original: 100,
            tokens_optimized: 100 - saved,
            best_format: Format::Toon,
            savings_percentage: "92.0%".to_string(),
            cost_savings_usd: 0.0000092,
            optimized_result: OptimizationResult {
                category,
                original_prompt: format!("prompt {id}"),
                optimized_markdown: String::new(),
                formats: FormatSet::default(),
                stats: ResultStats {
                    original_tokens: 5,
                    token_counts,
                },
            },
        }
    }

    #[test]
    fn test_empty_history() {
        let stats = aggregate(&[]);
        assert_eq!(stats.total_prompts, 0);
        assert_eq!(stats.total_token_savings, 0);
        assert!(stats.recent_optimizations.is_empty());
        assert!(stats.usage_by_day.is_empty());
        // Distribution buckets exist even with no data
        assert_eq!(stats.format_distribution.len(), 4);
        assert_eq!(stats.format_distribution[0].value, 0);
    }

    #[test]
    fn test_totals_and_distribution() {
        let records = vec![
            record("a", Category::Coding, 0, 92),
            record("b", Category::Coding, 1, 92),
            record("c", Category::Content, 2, 92),
        ];

        let stats = aggregate(&records);
        assert_eq!(stats.total_prompts, 3);
        assert_eq!(stats.total_token_savings, 276);
        assert!((stats.total_cost_saved_usd - 0.0000276).abs() < 1e-12);

        assert_eq!(stats.category_counts[0], NamedCount { name: "Coding".to_string(), value: 2 });
        assert_eq!(stats.category_counts[1], NamedCount { name: "Content".to_string(), value: 1 });

        let markdown = stats
            .format_distribution
            .iter()
            .find(|entry| entry.name == "Markdown")
            .unwrap();
        assert_eq!(markdown.value, 300);
        let toon = stats
            .format_distribution
            .iter()
            .find(|entry| entry.name == "TOON")
            .unwrap();
        assert_eq!(toon.value, 24);
    }

    #[test]
    fn test_recent_keeps_five_newest() {
        let records: Vec<HistoryRecord> = (0..8)
            .map(|i| record(&format!("r{i}"), Category::General, i, 10))
            .collect();

        let stats = aggregate(&records);
        assert_eq!(stats.recent_optimizations.len(), 5);
        assert_eq!(stats.recent_optimizations[0].id, "r0");
        assert_eq!(stats.recent_optimizations[4].id, "r4");
        assert_eq!(stats.recent_optimizations[0].format, Format::Toon);
    }

    #[test]
    fn test_usage_keeps_last_seven_days() {
        let records: Vec<HistoryRecord> = (0..10)
            .map(|i| record(&format!("r{i}"), Category::General, i, 10))
            .collect();

        let stats = aggregate(&records);
        assert_eq!(stats.usage_by_day.len(), 7);
        assert!(stats.usage_by_day.iter().all(|day| day.prompts == 1));
        // Newest day is last (ascending order for charting)
        let today = Utc::now().date_naive().format("%b %-d").to_string();
        assert_eq!(stats.usage_by_day.last().unwrap().name, today);
    }
}
