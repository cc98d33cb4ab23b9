//! Aggregation over classification history.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::history::ClassificationRecord;

/// Count and share for one label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
    /// Share of the total, rounded to one decimal
    pub percentage: f64,
}

/// Derived view over a user's history. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct StatsSummary {
    pub total: usize,
    /// Sorted by count descending, ties in first-seen order
    pub items: Vec<CategoryCount>,
}

impl StatsSummary {
    /// Most frequent label, if any.
    pub fn top(&self) -> Option<&CategoryCount> {
        self.items.first()
    }

    /// Entry for a label.
    pub fn get(&self, label: &str) -> Option<&CategoryCount> {
        self.items.iter().find(|item| item.label == label)
    }
}

/// Reduces history records into ranked counts.
pub struct StatsAggregator;

impl StatsAggregator {
    /// Compute the summary for a snapshot of records.
    ///
    /// Labels group by exact, case-sensitive match.
    pub fn compute(records: &[ClassificationRecord]) -> StatsSummary {
        Self::compute_labels(records.iter().map(|r| r.label.as_str()))
    }

    /// Compute the summary from a sequence of labels.
    pub fn compute_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> StatsSummary {
        let mut order: Vec<&'a str> = Vec::new();
        let mut counts: HashMap<&'a str, usize> = HashMap::new();

        for label in labels {
            let count = counts.entry(label).or_insert_with(|| {
                order.push(label);
                0
            });
            *count += 1;
        }

        let total: usize = counts.values().sum();
        if total == 0 {
            return StatsSummary::default();
        }

        let mut items: Vec<CategoryCount> = order
            .into_iter()
            .map(|label| {
                let count = counts[label];
                CategoryCount {
                    label: label.to_string(),
                    count,
                    percentage: round_one_decimal(count as f64 / total as f64 * 100.0),
                }
            })
            .collect();

        // Stable: equal counts keep first-seen order.
        items.sort_by(|a, b| b.count.cmp(&a.count));

        StatsSummary { total, items }
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels_of(summary: &StatsSummary) -> Vec<&str> {
        summary.items.iter().map(|i| i.label.as_str()).collect()
    }

    #[test]
    fn test_empty_input() {
        let summary = StatsAggregator::compute(&[]);
        assert_eq!(summary.total, 0);
        assert!(summary.items.is_empty());
        assert!(summary.top().is_none());
    }

    #[test]
    fn test_counts_and_order() {
        let summary = StatsAggregator::compute_labels(["A", "B", "A", "C", "B", "A"]);

        assert_eq!(summary.total, 6);
        assert_eq!(labels_of(&summary), vec!["A", "B", "C"]);
        assert_eq!(summary.get("A").unwrap().count, 3);
        assert_eq!(summary.get("B").unwrap().count, 2);
        assert_eq!(summary.get("C").unwrap().count, 1);
        assert_eq!(summary.get("A").unwrap().percentage, 50.0);
        assert_eq!(summary.get("B").unwrap().percentage, 33.3);
        assert_eq!(summary.get("C").unwrap().percentage, 16.7);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let summary = StatsAggregator::compute_labels(["X", "Y", "X", "Y"]);
        assert_eq!(labels_of(&summary), vec!["X", "Y"]);

        let summary = StatsAggregator::compute_labels(["Y", "X", "X", "Y"]);
        assert_eq!(labels_of(&summary), vec!["Y", "X"]);

        // Not alphabetical
        let summary = StatsAggregator::compute_labels(["Paper", "Glass", "Battery"]);
        assert_eq!(labels_of(&summary), vec!["Paper", "Glass", "Battery"]);
    }

    #[test]
    fn test_labels_are_case_sensitive() {
        let summary = StatsAggregator::compute_labels(["Glass", "glass"]);
        assert_eq!(summary.items.len(), 2);
    }

    #[test]
    fn test_totals_and_percentages_add_up() {
        let inputs: Vec<Vec<&str>> = vec![
            vec!["a"],
            vec!["a", "b", "c"],
            vec!["a", "b", "b", "c", "c", "c", "d"],
            vec!["q", "r", "s", "t", "u", "v", "w", "q", "q", "r", "z"],
        ];

        for labels in inputs {
            let summary = StatsAggregator::compute_labels(labels.iter().copied());
            assert_eq!(summary.total, labels.len());

            let count_sum: usize = summary.items.iter().map(|i| i.count).sum();
            assert_eq!(count_sum, summary.total);

            let pct_sum: f64 = summary.items.iter().map(|i| i.percentage).sum();
            let tolerance = 0.1 * summary.items.len() as f64;
            assert!((pct_sum - 100.0).abs() <= tolerance, "sum {}", pct_sum);
        }
    }

    #[test]
    fn test_compute_over_records() {
        let at: chrono::DateTime<chrono::Utc> = "2026-10-01T12:00:00Z".parse().unwrap();
        let record = |label: &str| ClassificationRecord {
            owner_id: "u".into(),
            owner_display_name: "U".into(),
            image_ref: "r".into(),
            label: label.into(),
            score: 0.5,
            created_at: at,
        };

        let records = vec![record("Glass"), record("Plastic"), record("Plastic")];
        let summary = StatsAggregator::compute(&records);

        assert_eq!(summary.top().unwrap().label, "Plastic");
        assert_eq!(summary.top().unwrap().percentage, 66.7);
    }
}
