//! Reference aggregation
//!
//! Several properties of one class often point at the same class. The
//! aggregator folds those association edges into one edge listing the
//! property names.

use std::collections::HashMap;

use crate::model::{Relationship, RelationshipKind};

/// Labels listed before the rest are summarised as `+K more`
pub const DEFAULT_MAX_LABELS: usize = 10;

#[derive(Debug, Clone)]
pub struct ReferenceAggregator {
    max_labels_to_show: usize,
}

impl Default for ReferenceAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LABELS)
    }
}

fn pair_counts(relationships: &[Relationship]) -> HashMap<(&str, &str), usize> {
    let mut counts = HashMap::new();
    for r in relationships.iter().filter(|r| r.kind == RelationshipKind::Association) {
        *counts.entry((r.source.as_str(), r.target.as_str())).or_insert(0) += 1;
    }
    counts
}

impl ReferenceAggregator {
    pub fn new(max_labels_to_show: usize) -> Self {
        Self {
            max_labels_to_show: max_labels_to_show.max(1),
        }
    }

    /// True when at least two distinct (source, target) pairs carry more
    /// than one association
    pub fn should_aggregate(&self, relationships: &[Relationship]) -> bool {
        pair_counts(relationships).values().filter(|c| **c > 1).count() >= 2
    }

    /// Label for `labels.len()` merged edges
    pub fn merged_label(&self, labels: &[String]) -> String {
        let total = labels.len();
        if total <= self.max_labels_to_show {
            return format!("{} properties ({})", total, labels.join(", "));
        }
        let shown = labels[..self.max_labels_to_show].join(", ");
        format!(
            "{} properties ({}… +{} more)",
            total,
            shown,
            total - self.max_labels_to_show
        )
    }

    /// Merge duplicate associations; the merged edge takes the position of
    /// the first one and other edge kinds pass through untouched
    pub fn aggregate(&self, relationships: &[Relationship]) -> Vec<Relationship> {
        let counts = pair_counts(relationships);
        let mut labels: HashMap<(&str, &str), Vec<String>> = HashMap::new();
        for r in relationships.iter().filter(|r| r.kind == RelationshipKind::Association) {
            let key = (r.source.as_str(), r.target.as_str());
            if counts.get(&key).copied().unwrap_or(0) > 1 {
                labels
                    .entry(key)
                    .or_default()
                    .push(r.label.clone().unwrap_or_else(|| "ref".to_string()));
            }
        }

        let mut out = Vec::with_capacity(relationships.len());
        for r in relationships {
            let key = (r.source.as_str(), r.target.as_str());
            if r.kind != RelationshipKind::Association {
                out.push(r.clone());
                continue;
            }
            match labels.remove(&key) {
                Some(merged) => {
                    let mut edge = Relationship::new(&r.source, &r.target, RelationshipKind::Association)
                        .with_label(self.merged_label(&merged))
                        .with_metadata("aggregated", merged.len().to_string());
                    for (k, v) in &r.metadata {
                        edge.metadata.entry(k.clone()).or_insert_with(|| v.clone());
                    }
                    out.push(edge);
                }
                // already merged into an earlier edge
                None if counts.get(&key).copied().unwrap_or(0) > 1 => {}
                None => out.push(r.clone()),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assoc(source: &str, target: &str, label: &str) -> Relationship {
        Relationship::new(source, target, RelationshipKind::Association).with_label(label)
    }

    #[test]
    fn test_single_edges_untouched() {
        let edges = vec![assoc("A", "B", "b"), assoc("A", "C", "c")];
        assert_eq!(ReferenceAggregator::default().aggregate(&edges), edges);
    }

    #[test]
    fn test_merge_keeps_first_position() {
        let edges = vec![
            assoc("Order", "Address", "billing"),
            Relationship::new("Order", "Item", RelationshipKind::Composition).with_label("items"),
            assoc("Order", "Address", "shipping"),
        ];
        let merged = ReferenceAggregator::default().aggregate(&edges);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].label.as_deref(), Some("2 properties (billing, shipping)"));
        assert_eq!(merged[0].metadata.get("aggregated").map(String::as_str), Some("2"));
        assert_eq!(merged[1].kind, RelationshipKind::Composition);
    }

    #[test]
    fn test_non_association_not_merged() {
        let edges = vec![
            Relationship::new("A", "B", RelationshipKind::Composition).with_label("x"),
            Relationship::new("A", "B", RelationshipKind::Composition).with_label("y"),
        ];
        assert_eq!(ReferenceAggregator::default().aggregate(&edges).len(), 2);
    }

    #[test]
    fn test_label_overflow() {
        let aggregator = ReferenceAggregator::new(2);
        let labels: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        assert_eq!(aggregator.merged_label(&labels), "4 properties (a, b… +2 more)");
    }

    #[test]
    fn test_should_aggregate_needs_two_pairs() {
        let aggregator = ReferenceAggregator::default();
        let one_pair = vec![assoc("A", "B", "x"), assoc("A", "B", "y")];
        assert!(!aggregator.should_aggregate(&one_pair));

        let mut two_pairs = one_pair.clone();
        two_pairs.push(assoc("C", "D", "x"));
        two_pairs.push(assoc("C", "D", "y"));
        assert!(aggregator.should_aggregate(&two_pairs));
    }
}
