//! Class diagram database
//!
//! Stores classes and relationships in insertion order. Adding a class whose
//! ID is already present is a no-op (first write wins), and so is adding a
//! relationship that repeats source, target, kind, label and cardinality.

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use serde::Serialize;

use super::class::Class;
use super::relationship::{EdgeKey, Relationship};
use crate::core::{Config, Database};
use crate::identifier::sanitize_id;

/// Class diagram database
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassDiagram {
    classes: Vec<Class>,
    relationships: Vec<Relationship>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    #[serde(skip)]
    edge_keys: HashSet<EdgeKey>,
    #[serde(skip)]
    config: Config,
}

impl ClassDiagram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Add a class; returns `false` when a class with the same ID exists
    pub fn add_class(&mut self, mut class: Class) -> bool {
        class.id = sanitize_id(&class.id);
        if self.index.contains_key(&class.id) {
            return false;
        }
        self.index.insert(class.id.clone(), self.classes.len());
        self.classes.push(class);
        true
    }

    /// Add a relationship; returns `false` for a duplicate
    pub fn add_relationship(&mut self, mut relationship: Relationship) -> bool {
        relationship.source = sanitize_id(&relationship.source);
        relationship.target = sanitize_id(&relationship.target);
        if !self.edge_keys.insert(relationship.key()) {
            return false;
        }
        self.relationships.push(relationship);
        true
    }

    pub fn classes(&self) -> &[Class] {
        &self.classes
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Mutable access for post-passes that only touch metadata
    pub fn relationships_mut(&mut self) -> impl Iterator<Item = &mut Relationship> {
        self.relationships.iter_mut()
    }

    /// Replace every relationship, re-applying deduplication
    pub fn replace_relationships(&mut self, relationships: Vec<Relationship>) {
        self.relationships.clear();
        self.edge_keys.clear();
        for relationship in relationships {
            self.add_relationship(relationship);
        }
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn has_class(&self, id: &str) -> bool {
        self.index.contains_key(&sanitize_id(id))
    }

    pub fn get_class(&self, id: &str) -> Option<&Class> {
        let index = *self.index.get(&sanitize_id(id))?;
        self.classes.get(index)
    }

    pub fn get_class_mut(&mut self, id: &str) -> Option<&mut Class> {
        let index = *self.index.get(&sanitize_id(id))?;
        self.classes.get_mut(index)
    }

    /// Add a stereotype to an existing class
    pub fn annotate(&mut self, id: &str, annotation: impl Into<String>) -> bool {
        match self.get_class_mut(id) {
            Some(class) => {
                class.add_annotation(annotation);
                true
            }
            None => false,
        }
    }
}

impl Database for ClassDiagram {
    type Node = Class;
    type Edge = Relationship;

    fn add_node(&mut self, node: Self::Node) -> Result<()> {
        self.add_class(node);
        Ok(())
    }

    fn add_edge(&mut self, edge: Self::Edge) -> Result<()> {
        self.add_relationship(edge);
        Ok(())
    }

    fn get_node(&self, id: &str) -> Option<&Self::Node> {
        self.get_class(id)
    }

    fn nodes(&self) -> impl Iterator<Item = &Self::Node> {
        self.classes.iter()
    }

    fn edges(&self) -> impl Iterator<Item = &Self::Edge> {
        self.relationships.iter()
    }

    fn clear(&mut self) {
        self.classes.clear();
        self.relationships.clear();
        self.index.clear();
        self.edge_keys.clear();
    }

    fn node_count(&self) -> usize {
        self.classes.len()
    }

    fn edge_count(&self) -> usize {
        self.relationships.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Property, RelationshipKind};

    #[test]
    fn test_add_class_first_write_wins() {
        let mut diagram = ClassDiagram::new();
        let mut first = Class::new("Pet", "Pet");
        first.add_property(Property::new("id", "integer"));
        assert!(diagram.add_class(first));
        assert!(!diagram.add_class(Class::new("Pet", "Other")));

        assert_eq!(diagram.class_count(), 1);
        let pet = diagram.get_class("Pet").unwrap();
        assert_eq!(pet.name, "Pet");
        assert_eq!(pet.properties.len(), 1);
    }

    #[test]
    fn test_ids_are_sanitized_on_insert() {
        let mut diagram = ClassDiagram::new();
        diagram.add_class(Class::new("common.yaml#/Pet", "Pet"));
        assert_eq!(diagram.classes()[0].id, "common_yaml__Pet");
        assert!(diagram.has_class("common.yaml#/Pet"));
        assert!(diagram.get_class("common_yaml__Pet").is_some());
    }

    #[test]
    fn test_insertion_order() {
        let mut diagram = ClassDiagram::new();
        for id in ["Zebra", "Apple", "Mango"] {
            diagram.add_class(Class::new(id, id));
        }
        let ids: Vec<_> = diagram.nodes().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["Zebra", "Apple", "Mango"]);
    }

    #[test]
    fn test_relationship_dedup_on_five_tuple() {
        let mut diagram = ClassDiagram::new();
        let rel = Relationship::new("Order", "OrderItem", RelationshipKind::Composition)
            .with_label("items")
            .with_cardinality("0..*");
        assert!(diagram.add_relationship(rel.clone()));
        assert!(!diagram.add_relationship(rel.clone().with_metadata("x", "y")));
        assert!(diagram.add_relationship(rel.clone().with_label("lines")));
        assert!(diagram.add_relationship(
            Relationship::new("Order", "OrderItem", RelationshipKind::Association).with_label("items")
        ));
        assert_eq!(diagram.relationship_count(), 3);
    }

    #[test]
    fn test_replace_relationships_dedupes() {
        let mut diagram = ClassDiagram::new();
        let rel = Relationship::new("A", "B", RelationshipKind::Association);
        diagram.replace_relationships(vec![rel.clone(), rel]);
        assert_eq!(diagram.edge_count(), 1);
    }

    #[test]
    fn test_annotate() {
        let mut diagram = ClassDiagram::new();
        diagram.add_class(Class::new("Pet", "Pet"));
        assert!(diagram.annotate("Pet", "reused (5 refs)"));
        assert!(!diagram.annotate("Missing", "x"));
        assert!(diagram.get_class("Pet").unwrap().has_annotation("reused (5 refs)"));
    }

    #[test]
    fn test_clear() {
        let mut diagram = ClassDiagram::new();
        diagram.add_class(Class::new("A", "A"));
        diagram.add_relationship(Relationship::new("A", "A", RelationshipKind::Dependency));
        diagram.clear();
        assert_eq!(diagram.node_count(), 0);
        assert_eq!(diagram.edge_count(), 0);
        assert!(diagram.add_class(Class::new("A", "A")));
    }
}
