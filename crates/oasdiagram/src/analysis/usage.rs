//! Component usage analysis
//!
//! Counts incoming references per class. Container-membership edges (marked
//! `structural`) are not references and are ignored.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use indexmap::IndexMap;
use serde::Serialize;

use crate::model::ClassDiagram;

/// Classes with at least this many references are annotated by default
pub const DEFAULT_MIN_REFS_FOR_ANNOTATION: usize = 5;

/// Usage bucket by incoming reference count
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UsageTier {
    /// Fewer than 5
    Low,
    /// 5 to 9
    Medium,
    /// 10 to 49
    High,
    /// 50 or more
    VeryHigh,
}

impl UsageTier {
    pub fn from_count(count: usize) -> Self {
        match count {
            0..=4 => UsageTier::Low,
            5..=9 => UsageTier::Medium,
            10..=49 => UsageTier::High,
            _ => UsageTier::VeryHigh,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UsageTier::Low => "low",
            UsageTier::Medium => "medium",
            UsageTier::High => "high",
            UsageTier::VeryHigh => "very-high",
        }
    }

    /// Annotation text for a class in this tier
    pub fn annotation(self, count: usize) -> String {
        match self {
            UsageTier::Low => format!("referenced ({} refs)", count),
            UsageTier::Medium => format!("reused ({} refs)", count),
            UsageTier::High => format!("highly reused ({} refs)", count),
            UsageTier::VeryHigh => format!("very highly reused ({} refs)", count),
        }
    }
}

/// Incoming references of one class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentUsage {
    pub class_id: String,
    pub count: usize,
    pub tier: UsageTier,
    /// Distinct source class IDs, in edge order
    pub sources: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct UsageAnalyzer {
    min_refs_for_annotation: usize,
}

impl Default for UsageAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_REFS_FOR_ANNOTATION)
    }
}

impl UsageAnalyzer {
    pub fn new(min_refs_for_annotation: usize) -> Self {
        Self {
            min_refs_for_annotation: min_refs_for_annotation.max(1),
        }
    }

    /// Usage of every class, in class insertion order
    pub fn analyze(&self, diagram: &ClassDiagram) -> IndexMap<String, ComponentUsage> {
        let mut usage: IndexMap<String, ComponentUsage> = diagram
            .classes()
            .iter()
            .map(|class| {
                (
                    class.id.clone(),
                    ComponentUsage {
                        class_id: class.id.clone(),
                        count: 0,
                        tier: UsageTier::Low,
                        sources: Vec::new(),
                    },
                )
            })
            .collect();

        for relationship in diagram.relationships().iter().filter(|r| !r.is_structural()) {
            if let Some(entry) = usage.get_mut(&relationship.target) {
                entry.count += 1;
                if !entry.sources.contains(&relationship.source) {
                    entry.sources.push(relationship.source.clone());
                }
            }
        }
        for entry in usage.values_mut() {
            entry.tier = UsageTier::from_count(entry.count);
        }
        usage
    }

    /// Annotate classes referenced at least `min_refs_for_annotation` times;
    /// returns how many were annotated
    pub fn annotate_with_usage(&self, diagram: &mut ClassDiagram) -> usize {
        let usage = self.analyze(diagram);
        let mut annotated = 0;
        for entry in usage.values().filter(|u| u.count >= self.min_refs_for_annotation) {
            if diagram.annotate(&entry.class_id, entry.tier.annotation(entry.count)) {
                annotated += 1;
            }
        }
        annotated
    }

    /// The `n` most referenced classes, most referenced first; ties go to
    /// the class inserted first
    pub fn get_most_reused_components(&self, diagram: &ClassDiagram, n: usize) -> Vec<ComponentUsage> {
        if n == 0 {
            return Vec::new();
        }
        let usage = self.analyze(diagram);

        // Min-heap of (count, earlier-is-better) keeps the best n seen so far
        let mut heap: BinaryHeap<Reverse<(usize, Reverse<usize>)>> = BinaryHeap::with_capacity(n + 1);
        for (position, entry) in usage.values().enumerate() {
            if entry.count == 0 {
                continue;
            }
            heap.push(Reverse((entry.count, Reverse(position))));
            if heap.len() > n {
                heap.pop();
            }
        }

        let mut ranked: Vec<(usize, Reverse<usize>)> = heap.into_iter().map(|Reverse(key)| key).collect();
        ranked.sort_by(|a, b| b.cmp(a));
        ranked
            .into_iter()
            .filter_map(|(_, Reverse(position))| usage.get_index(position).map(|(_, u)| u.clone()))
            .collect()
    }

    /// IDs of classes nothing refers to
    pub fn get_unused_components(&self, diagram: &ClassDiagram) -> Vec<String> {
        self.analyze(diagram)
            .into_values()
            .filter(|u| u.count == 0)
            .map(|u| u.class_id)
            .collect()
    }
}
