//! Inheritance analyzer
//!
//! Flattens `allOf` chains into a record per property saying which schema
//! declares it and whether it is inherited or overridden.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::core::{LruCache, INHERITANCE_CACHE_SIZE};
use crate::openapi::{Schema, SchemaResolver};

use super::member_id;

/// Recursion cap for nested `allOf` chains
const MAX_CHAIN_DEPTH: usize = 32;

/// Where a property comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySource {
    pub name: String,
    pub source_schema: String,
    pub inherited: bool,
    pub overridden: bool,
}

pub type PropertySources = IndexMap<String, PropertySource>;

#[derive(Debug)]
pub struct InheritanceAnalyzer {
    cache: LruCache<String, PropertySources>,
}

impl Default for InheritanceAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl InheritanceAnalyzer {
    pub fn new() -> Self {
        Self {
            cache: LruCache::new(INHERITANCE_CACHE_SIZE),
        }
    }

    /// Property name → source record for `schema`
    pub fn analyze(
        &self,
        schema_id: &str,
        schema: &Schema,
        resolver: &dyn SchemaResolver,
    ) -> PropertySources {
        self.cache.get_or_insert_with(schema_id.to_string(), || {
            Self::compute(schema_id, schema, resolver)
        })
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    fn compute(schema_id: &str, schema: &Schema, resolver: &dyn SchemaResolver) -> PropertySources {
        let mut sources = PropertySources::new();

        // Which allOf member first contributed each property
        let mut contributed_by: IndexMap<String, usize> = IndexMap::new();
        for (index, member) in schema.all_of.iter().enumerate() {
            let member_id = member_id(schema_id, &format!("allOf_{}", index), member);
            let mut names = Vec::new();
            let mut seen = HashSet::new();
            collect_properties(member, resolver, &mut names, &mut seen, 0);

            for name in names {
                match contributed_by.get(&name) {
                    None => {
                        contributed_by.insert(name.clone(), index);
                        sources.insert(
                            name.clone(),
                            PropertySource {
                                name,
                                source_schema: member_id.clone(),
                                inherited: true,
                                overridden: false,
                            },
                        );
                    }
                    Some(first) if *first != index => {
                        if let Some(existing) = sources.get_mut(&name) {
                            existing.overridden = true;
                        }
                    }
                    Some(_) => {}
                }
            }
        }

        for name in schema.properties.keys() {
            let overridden = sources.get(name).is_some_and(|s| s.inherited);
            sources.insert(
                name.clone(),
                PropertySource {
                    name: name.clone(),
                    source_schema: schema_id.to_string(),
                    inherited: false,
                    overridden,
                },
            );
        }

        sources
    }

    pub fn get_inherited_properties(sources: &PropertySources) -> Vec<&PropertySource> {
        sources.values().filter(|s| s.inherited).collect()
    }

    pub fn get_overridden_properties(sources: &PropertySources) -> Vec<&PropertySource> {
        sources.values().filter(|s| s.overridden).collect()
    }
}

/// Property names a schema contributes, including those of its own `allOf`
fn collect_properties(
    schema: &Schema,
    resolver: &dyn SchemaResolver,
    names: &mut Vec<String>,
    seen_refs: &mut HashSet<String>,
    depth: usize,
) {
    if depth > MAX_CHAIN_DEPTH {
        return;
    }
    if let Some(reference) = schema.reference_path() {
        if !seen_refs.insert(reference.to_string()) {
            return;
        }
    }
    let Some(schema) = resolver.resolve_chain(schema) else {
        return;
    };
    for member in &schema.all_of {
        collect_properties(member, resolver, names, seen_refs, depth + 1);
    }
    for name in schema.properties.keys() {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }
}
