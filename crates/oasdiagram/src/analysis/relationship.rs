//! Relationship analyzer
//!
//! Classifies how a schema is composed and lists the edges its composition
//! keywords imply.

use serde::Serialize;
use tracing::trace;

use crate::core::{LruCache, DEFAULT_CACHE_SIZE};
use crate::identifier::ref_tail;
use crate::model::{Relationship, RelationshipKind};
use crate::openapi::{Schema, SchemaResolver};

use super::member_id;

/// Default recursion cap for [`RelationshipAnalyzer::analyze_schema`]
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// How a schema is built from other schemas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompositionPattern {
    None,
    /// One `allOf` base, no own properties
    Inheritance,
    /// Several `allOf` bases, no own properties
    MultipleInheritance,
    /// Bases plus own properties
    Extension,
    /// A base named like a mixin or trait
    Mixin,
    /// `oneOf` / `anyOf` without `allOf`
    Union,
}

impl CompositionPattern {
    /// Patterns handled by flattening `allOf` into one class
    pub fn flattens(self) -> bool {
        matches!(
            self,
            CompositionPattern::Inheritance
                | CompositionPattern::MultipleInheritance
                | CompositionPattern::Extension
                | CompositionPattern::Mixin
        )
    }
}

#[derive(Debug)]
pub struct RelationshipAnalyzer {
    edges: LruCache<String, Vec<Relationship>>,
    patterns: LruCache<String, CompositionPattern>,
    max_depth: usize,
}

impl Default for RelationshipAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

/// Name a mixin check looks at: the `$ref` tail or the title
fn variant_name(schema: &Schema) -> Option<&str> {
    schema.reference_path().map(ref_tail).or_else(|| schema.title())
}

fn is_mixin_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("mixin") || lower.contains("trait")
}

impl RelationshipAnalyzer {
    pub fn new(max_depth: usize) -> Self {
        Self {
            edges: LruCache::new(DEFAULT_CACHE_SIZE),
            patterns: LruCache::new(DEFAULT_CACHE_SIZE),
            max_depth,
        }
    }

    /// Composition pattern of `schema`, cached by ID
    pub fn detect_pattern(
        &self,
        schema_id: &str,
        schema: &Schema,
        resolver: &dyn SchemaResolver,
    ) -> CompositionPattern {
        self.patterns.get_or_insert_with(schema_id.to_string(), || {
            Self::classify(schema, resolver)
        })
    }

    fn classify(schema: &Schema, resolver: &dyn SchemaResolver) -> CompositionPattern {
        if !schema.all_of.is_empty() {
            if schema.all_of.iter().filter_map(variant_name).any(is_mixin_name) {
                return CompositionPattern::Mixin;
            }
            let own_properties = !schema.properties.is_empty()
                || schema.all_of.iter().any(|member| {
                    !member.is_ref()
                        && resolver
                            .resolve_chain(member)
                            .is_some_and(|m| !m.properties.is_empty())
                });
            return match (schema.all_of.len(), own_properties) {
                (1, false) => CompositionPattern::Inheritance,
                (_, false) => CompositionPattern::MultipleInheritance,
                _ => CompositionPattern::Extension,
            };
        }
        if schema.union_variants().is_some() {
            return CompositionPattern::Union;
        }
        CompositionPattern::None
    }

    /// Every edge implied by the composition keywords of `schema` and of its
    /// inline members, down to the depth cap
    pub fn analyze_schema(&self, schema_id: &str, schema: &Schema) -> Vec<Relationship> {
        if let Some(cached) = self.edges.get(&schema_id.to_string()) {
            return cached;
        }
        let mut edges = Vec::new();
        self.collect(schema_id, schema, 0, &mut edges);
        self.edges.insert(schema_id.to_string(), edges.clone());
        edges
    }

    fn collect(&self, schema_id: &str, schema: &Schema, depth: usize, edges: &mut Vec<Relationship>) {
        if depth > self.max_depth {
            trace!(schema_id, depth, "Relationship depth cap reached");
            return;
        }

        let keyword_groups: [(&str, &[Schema], RelationshipKind); 3] = [
            ("allOf", schema.all_of.as_slice(), RelationshipKind::Inheritance),
            ("oneOf", schema.one_of.as_slice(), RelationshipKind::Association),
            ("anyOf", schema.any_of.as_slice(), RelationshipKind::Association),
        ];
        for (keyword, members, kind) in keyword_groups {
            for (index, member) in members.iter().enumerate() {
                let target = member_id(schema_id, &format!("{}_{}", keyword, index), member);
                edges.push(Relationship::new(schema_id, &target, kind).with_label(keyword));
                if !member.is_ref() {
                    self.collect(&target, member, depth + 1, edges);
                }
            }
        }

        for (target, child, edge) in self.container_edges(schema_id, schema) {
            edges.push(edge);
            if !child.is_ref() {
                self.collect(&target, child, depth + 1, edges);
            }
        }
    }

    /// Edges for `items`, `additionalProperties` and `not`, with the target
    /// ID and schema of each
    pub fn container_edges<'a>(
        &self,
        schema_id: &str,
        schema: &'a Schema,
    ) -> Vec<(String, &'a Schema, Relationship)> {
        let mut out = Vec::new();
        if let Some(items) = schema.items.as_deref() {
            let target = member_id(schema_id, "items", items);
            let edge = Relationship::new(schema_id, &target, RelationshipKind::Composition)
                .with_label("items")
                .with_cardinality("0..*");
            out.push((target, items, edge));
        }
        if let Some(extra) = schema
            .additional_properties
            .as_ref()
            .and_then(|a| a.as_schema())
        {
            let target = member_id(schema_id, "additionalProperties", extra);
            let edge = Relationship::new(schema_id, &target, RelationshipKind::Composition)
                .with_label("additionalProperties");
            out.push((target, extra, edge));
        }
        if let Some(not) = schema.not.as_deref() {
            let target = member_id(schema_id, "not", not);
            let edge = Relationship::new(schema_id, &target, RelationshipKind::Negation).with_label("not");
            out.push((target, not, edge));
        }
        out
    }

    pub fn clear_cache(&self) {
        self.edges.clear();
        self.patterns.clear();
    }
}
