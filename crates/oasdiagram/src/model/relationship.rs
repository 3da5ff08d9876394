//! Relationships between classes

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Relationship type between classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipKind {
    Inheritance, // <|--
    Composition, // *--
    Aggregation, // o--
    Association, // -->
    Dependency,  // ..>
    Realization, // ..|>
    Negation,    // -.x
}

impl RelationshipKind {
    /// Arrow used by the class diagram dialect
    pub fn arrow(self) -> &'static str {
        match self {
            RelationshipKind::Inheritance => "<|--",
            RelationshipKind::Composition => "*--",
            RelationshipKind::Aggregation => "o--",
            RelationshipKind::Association => "-->",
            RelationshipKind::Dependency => "..>",
            RelationshipKind::Realization => "..|>",
            RelationshipKind::Negation => "-.x",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RelationshipKind::Inheritance => "inheritance",
            RelationshipKind::Composition => "composition",
            RelationshipKind::Aggregation => "aggregation",
            RelationshipKind::Association => "association",
            RelationshipKind::Dependency => "dependency",
            RelationshipKind::Realization => "realization",
            RelationshipKind::Negation => "negation",
        }
    }
}

/// Identity of an edge for deduplication
pub type EdgeKey = (String, String, RelationshipKind, Option<String>, Option<String>);

/// A relationship between classes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub source: String,
    pub target: String,
    pub kind: RelationshipKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub metadata: IndexMap<String, String>,
}

impl Relationship {
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: RelationshipKind) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
            label: None,
            cardinality: None,
            metadata: IndexMap::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_cardinality(mut self, cardinality: impl Into<String>) -> Self {
        self.cardinality = Some(cardinality.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Container-membership edge, ignored by usage counting
    pub fn structural(self) -> Self {
        self.with_metadata("structural", "true")
    }

    pub fn is_structural(&self) -> bool {
        self.metadata.get("structural").is_some_and(|v| v == "true")
    }

    pub fn key(&self) -> EdgeKey {
        (
            self.source.clone(),
            self.target.clone(),
            self.kind,
            self.label.clone(),
            self.cardinality.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrows() {
        assert_eq!(RelationshipKind::Inheritance.arrow(), "<|--");
        assert_eq!(RelationshipKind::Negation.arrow(), "-.x");
        assert_eq!(RelationshipKind::Realization.arrow(), "..|>");
    }

    #[test]
    fn test_key_ignores_metadata() {
        let plain = Relationship::new("A", "B", RelationshipKind::Composition).with_label("b");
        let tagged = plain.clone().with_metadata("external", "true");
        assert_eq!(plain.key(), tagged.key());
        assert_ne!(plain.key(), plain.clone().with_cardinality("0..*").key());
    }

    #[test]
    fn test_structural_flag() {
        let rel = Relationship::new("Components", "Pet", RelationshipKind::Aggregation).structural();
        assert!(rel.is_structural());
        assert!(!Relationship::new("A", "B", RelationshipKind::Association).is_structural());
    }
}
