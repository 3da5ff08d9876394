//! Discriminator analyzer
//!
//! Explicit `discriminator.mapping` entries are taken as declared. Without a
//! mapping, values are inferred from each union variant's discriminator
//! property (a single-value `enum` or a `const`).

use indexmap::IndexMap;
use tracing::trace;

use crate::core::{LruCache, DISCRIMINATOR_CACHE_SIZE};
use crate::identifier::ref_tail;
use crate::openapi::{Schema, SchemaResolver};

use super::{format_value, member_id};

/// Recursion cap when searching a variant's `allOf` chain
const MAX_SEARCH_DEPTH: usize = 10;

/// Resolved discriminator of a union schema
#[derive(Debug, Clone, PartialEq)]
pub struct DiscriminatorInfo {
    pub property_name: String,
    /// Discriminator value → variant (a `$ref` for explicit mappings, a class
    /// ID for inferred ones)
    pub mapping: IndexMap<String, String>,
    pub implicit: bool,
}

impl DiscriminatorInfo {
    /// Values mapping to the class `variant_id`
    pub fn values_for(&self, variant_id: &str) -> Vec<String> {
        self.mapping
            .iter()
            .filter(|(_, target)| *target == variant_id || ref_tail(target) == variant_id)
            .map(|(value, _)| value.clone())
            .collect()
    }
}

#[derive(Debug)]
pub struct DiscriminatorAnalyzer {
    cache: LruCache<String, Option<DiscriminatorInfo>>,
}

impl Default for DiscriminatorAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscriminatorAnalyzer {
    pub fn new() -> Self {
        Self {
            cache: LruCache::new(DISCRIMINATOR_CACHE_SIZE),
        }
    }

    /// Discriminator of `schema`, `None` when it declares none
    pub fn analyze(
        &self,
        schema_id: &str,
        schema: &Schema,
        resolver: &dyn SchemaResolver,
    ) -> Option<DiscriminatorInfo> {
        self.cache.get_or_insert_with(schema_id.to_string(), || {
            Self::compute(schema_id, schema, resolver)
        })
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    fn compute(
        schema_id: &str,
        schema: &Schema,
        resolver: &dyn SchemaResolver,
    ) -> Option<DiscriminatorInfo> {
        let discriminator = schema.discriminator.as_ref()?;
        let property_name = discriminator.property_name.clone();

        if !discriminator.mapping.is_empty() {
            return Some(DiscriminatorInfo {
                property_name,
                mapping: discriminator.mapping.clone(),
                implicit: false,
            });
        }

        let mut mapping = IndexMap::new();
        if let Some((keyword, variants)) = schema.union_variants() {
            for (index, variant) in variants.iter().enumerate() {
                let variant_id = member_id(schema_id, &format!("{}_{}", keyword, index), variant);
                let value = resolver
                    .resolve_chain(variant)
                    .and_then(|target| find_value(target, &property_name, resolver, 0));
                match (value, variant.reference_path()) {
                    (Some(value), _) => {
                        mapping.insert(value, variant_id);
                    }
                    (None, Some(reference)) => {
                        mapping.insert(ref_tail(reference).to_string(), variant_id);
                    }
                    (None, None) => {
                        trace!(schema_id, index, "No discriminator value for inline variant");
                    }
                }
            }
        }

        Some(DiscriminatorInfo {
            property_name,
            mapping,
            implicit: true,
        })
    }
}

/// Constant value of `property` in `schema` or anywhere in its `allOf` chain
fn find_value(
    schema: &Schema,
    property: &str,
    resolver: &dyn SchemaResolver,
    depth: usize,
) -> Option<String> {
    if depth > MAX_SEARCH_DEPTH {
        return None;
    }
    if let Some(prop) = schema.properties.get(property) {
        let prop = resolver.resolve_chain(prop).unwrap_or(prop);
        if let [single] = prop.enum_values.as_slice() {
            return Some(format_value(single));
        }
        if let Some(value) = &prop.const_value {
            return Some(format_value(value));
        }
    }
    schema.all_of.iter().find_map(|member| {
        let member = resolver.resolve_chain(member)?;
        find_value(member, property, resolver, depth + 1)
    })
}
