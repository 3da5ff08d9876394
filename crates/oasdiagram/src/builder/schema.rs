//! Schema visiting
//!
//! Enter, classify, build, exit. A schema's class is appended only once all
//! of the classes it pulls in have been appended.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::{debug, span, trace, Level};

use crate::analysis::{parse_ref, CompositionPattern, RefInfo};
use crate::identifier::{component_schema_name, sanitize_id, Location};
use crate::model::{Class, ClassDiagram, Property, Relationship, RelationshipKind};
use crate::openapi::{JsonPath, Schema, SchemaResolver};

use super::DiagramBuilder;

/// A property waiting for its slot in a class
pub(super) struct PendingProperty<'a> {
    pub name: &'a str,
    pub schema: &'a Schema,
    pub required: Vec<String>,
    pub location: Location,
}

/// Queue the properties of `properties`, skipping names already queued
pub(super) fn queue_properties<'a>(
    pending: &mut Vec<PendingProperty<'a>>,
    seen: &mut HashSet<&'a str>,
    properties: &'a IndexMap<String, Schema>,
    required: &[String],
    location: &Location,
    owner_id: &str,
) {
    let container = location.child("properties", owner_id);
    for (name, schema) in properties {
        if !seen.insert(name.as_str()) {
            continue;
        }
        pending.push(PendingProperty {
            name,
            schema,
            required: required.to_vec(),
            location: container.child(name.clone(), owner_id),
        });
    }
}

/// Label a schema class is shown with: title, component key, or the ID
fn class_label(schema: &Schema, id: &str, location: &Location) -> String {
    schema
        .title()
        .or_else(|| component_schema_name(&location.path))
        .unwrap_or(id)
        .to_string()
}

impl<'a> DiagramBuilder<'a> {
    /// Visit `schema` at `location`; returns the ID edges should point at
    pub(crate) fn visit_schema(
        &mut self,
        diagram: &mut ClassDiagram,
        schema: &'a Schema,
        location: &Location,
    ) -> Option<String> {
        self.visit_schema_as(diagram, schema, location, None)
    }

    /// Visit `schema`, using `forced_id` instead of the derived ID
    pub(crate) fn visit_schema_as(
        &mut self,
        diagram: &mut ClassDiagram,
        schema: &'a Schema,
        location: &Location,
        forced_id: Option<String>,
    ) -> Option<String> {
        let path = location.path.clone();
        if self.state.owned.contains(&path) {
            return self.state.representatives.get(&path).cloned();
        }

        if let Some(reference) = schema.reference_path() {
            if !self.state.visited.insert(path.clone()) {
                return self.state.representatives.get(&path).cloned();
            }
            let target = self.visit_reference(diagram, reference, location.parent_id.as_deref());
            if let Some(target) = &target {
                self.state.representatives.insert(path, target.clone());
            }
            return target;
        }

        if self.state.visited.contains(&path) {
            let id = self.state.representatives.get(&path).cloned()?;
            self.circular_edge(diagram, location.parent_id.as_deref(), &id);
            return Some(id);
        }
        if self.state.in_progress.len() >= self.config.general_depth() {
            trace!(path = %path, "Depth cap reached");
            return None;
        }
        if !self.can_create(diagram) {
            return None;
        }

        self.state.visited.insert(path.clone());
        let id = self.schema_class_id(forced_id.unwrap_or_else(|| self.identifier.schema_id(schema, location)));
        self.state.representatives.insert(path, id.clone());

        let visit_span = span!(Level::TRACE, "visit_schema", id = id.as_str(), path = %location.path);
        let _enter = visit_span.enter();

        let pattern = self.relationships.detect_pattern(&id, schema, self.document);
        trace!(?pattern, "Classified");
        let id = match pattern {
            p if p.flattens() => self.flatten_all_of(diagram, schema, &id, location),
            CompositionPattern::Union => match schema.union_variants() {
                Some((keyword, variants)) if variants.len() >= 2 => {
                    self.create_placeholder(diagram, schema, &id, location, keyword, variants)
                }
                _ => self.build_plain_class(diagram, schema, &id, location),
            },
            _ if schema.is_enum() && schema.properties.is_empty() => {
                self.build_enum_class(diagram, schema, &id, location)
            }
            _ => self.build_plain_class(diagram, schema, &id, location),
        };
        Some(id)
    }

    /// Follow a `$ref` to the class of its target
    ///
    /// Local references visit the target at its canonical path, so every
    /// reference to a schema shares one class. A reference back into a class
    /// still under construction is drawn as `circular` from `parent`.
    pub(crate) fn visit_reference(
        &mut self,
        diagram: &mut ClassDiagram,
        reference: &str,
        parent: Option<&str>,
    ) -> Option<String> {
        let info = parse_ref(reference);
        if !info.is_local {
            return self.external_placeholder(diagram, &info);
        }
        let path = JsonPath::from_pointer(reference)?;

        if self.state.visited.contains(&path) || self.state.owned.contains(&path) {
            let id = self.state.representatives.get(&path).cloned()?;
            if self.is_in_progress(&id) {
                self.circular_edge(diagram, parent, &id);
            }
            return Some(id);
        }

        let document = self.document;
        match document.resolve_schema(reference) {
            Some(schema) if self.config.filter.exclude_deprecated && schema.deprecated => {
                debug!(reference, "Skipping deprecated schema");
                None
            }
            Some(schema) => {
                let location = Location {
                    path,
                    key: Some(info.schema_name.clone()),
                    ..Location::default()
                };
                self.visit_schema(diagram, schema, &location)
            }
            None => self.unresolved_placeholder(diagram, &info),
        }
    }

    /// Visit every component schema, linking each to `container` if given
    pub(super) fn visit_component_schemas(
        &mut self,
        diagram: &mut ClassDiagram,
        container: Option<&str>,
    ) {
        let document = self.document;
        for (name, schema) in document.component_schemas() {
            if self.cancel.is_cancelled() {
                break;
            }
            if self.config.filter.exclude_deprecated && schema.deprecated {
                debug!(schema = name.as_str(), "Skipping deprecated schema");
                continue;
            }
            let location = Location::component_schema(name);
            let id = if self.state.visited.contains(&location.path) {
                self.state.representatives.get(&location.path).cloned()
            } else {
                self.visit_schema(diagram, schema, &location)
            };
            if let (Some(container), Some(id)) = (container, id) {
                diagram.add_relationship(
                    Relationship::new(container, id, RelationshipKind::Aggregation)
                        .with_label("schema")
                        .structural(),
                );
            }
        }
    }

    /// Class for a schema with no composition
    fn build_plain_class(
        &mut self,
        diagram: &mut ClassDiagram,
        schema: &'a Schema,
        id: &str,
        location: &Location,
    ) -> String {
        let mut class = self.new_class(id, &class_label(schema, id, location), location);
        self.decorate(&mut class, schema);
        self.state.in_progress.push(id.to_string());

        let mut pending = Vec::new();
        let mut seen = HashSet::new();
        queue_properties(&mut pending, &mut seen, &schema.properties, &schema.required, location, id);
        self.emit_properties(diagram, &mut class, id, pending);
        self.mark_discriminator(&mut class, schema);

        // A lone union variant is an ordinary association
        if let Some((keyword, [variant])) = schema.union_variants() {
            let target = match variant.reference_path() {
                Some(reference) => self.visit_reference(diagram, reference, Some(id)),
                None if !variant.is_simple_scalar() => {
                    self.visit_schema(diagram, variant, &location.child(keyword, id).indexed(0, id))
                }
                None => None,
            };
            if let Some(target) = target {
                self.link(
                    diagram,
                    Relationship::new(id, &target, RelationshipKind::Association).with_label(keyword),
                    variant.reference_path(),
                );
            }
        }

        for (_, child, mut edge) in self.relationships.container_edges(id, schema) {
            let slot = edge.label.clone().unwrap_or_default();
            let target = match child.reference_path() {
                Some(reference) => self.visit_reference(diagram, reference, Some(id)),
                None if child.title().is_some()
                    || !child.properties.is_empty()
                    || child.has_composition() =>
                {
                    self.visit_schema(diagram, child, &location.child(slot, id))
                }
                None => None,
            };
            if let Some(target) = target {
                edge.target = target;
                if !self.config.cardinality_enabled() {
                    edge.cardinality = None;
                }
                self.link(diagram, edge, child.reference_path());
            }
        }

        self.state.in_progress.pop();
        self.finish_class(diagram, class)
    }

    /// `<<enumeration>>` class for an enum schema
    fn build_enum_class(
        &mut self,
        diagram: &mut ClassDiagram,
        schema: &'a Schema,
        id: &str,
        location: &Location,
    ) -> String {
        let label = class_label(schema, id, location);
        match self.enums.analyze_enum(schema, &label) {
            Some(info) => {
                let mut class = self.enums.create_enum_class(&info, id);
                class.name = self.identifier.display_name(&label);
                class.namespace = self.namespace_for(&location.path);
                self.decorate(&mut class, schema);
                self.finish_class(diagram, class)
            }
            None => self.build_plain_class(diagram, schema, id, location),
        }
    }

    /// Run queued properties through the property processor, truncating
    /// past the configured maximum (0 keeps every property)
    pub(super) fn emit_properties(
        &mut self,
        diagram: &mut ClassDiagram,
        class: &mut Class,
        owner_id: &str,
        pending: Vec<PendingProperty<'a>>,
    ) {
        let max = match self.config.max_properties() {
            0 => usize::MAX,
            max => max,
        };
        let total = pending.len();
        for item in pending.into_iter().take(max) {
            let property = self.process_property(
                diagram,
                owner_id,
                item.name,
                item.schema,
                &item.required,
                &item.location,
            );
            class.add_property(property);
        }
        if total > max {
            class.add_property(Property::truncation(total - max));
        }
    }

    /// Annotations every schema class gets from its own keywords
    pub(super) fn decorate(&self, class: &mut Class, schema: &Schema) {
        if schema.deprecated {
            class.add_annotation("deprecated");
        }
        let threshold = usize::try_from(self.config.schema.large_schema_threshold).unwrap_or(0);
        if self.config.schema.collapse_large_schemas && schema.properties.len() > threshold {
            class.add_annotation(format!("large schema ({} properties)", schema.properties.len()));
        }
    }

    /// Flag the discriminator property of a schema that declares one
    pub(super) fn mark_discriminator(&self, class: &mut Class, schema: &Schema) {
        if !self.config.schema.show_discriminators {
            return;
        }
        let Some(discriminator) = &schema.discriminator else {
            return;
        };
        class
            .metadata
            .insert("discriminator".to_string(), discriminator.property_name.clone());
        for property in &mut class.properties {
            if property.name.split(" (").next() == Some(discriminator.property_name.as_str()) {
                property.is_discriminator = true;
            }
        }
    }

    /// Placeholder class for a reference into another file
    fn external_placeholder(&mut self, diagram: &mut ClassDiagram, info: &RefInfo) -> Option<String> {
        let id = self.schema_class_id(sanitize_id(&self.external.placeholder_id(info)));
        if diagram.has_class(&id) {
            return Some(id);
        }
        if !self.can_create(diagram) {
            return None;
        }
        trace!(reference = info.raw.as_str(), "External reference");
        let mut class = self.external.create_placeholder(info);
        class.id = id;
        Some(self.finish_class(diagram, class))
    }

    /// Placeholder class for a local reference with no target
    fn unresolved_placeholder(&mut self, diagram: &mut ClassDiagram, info: &RefInfo) -> Option<String> {
        let id = self.schema_class_id(sanitize_id(&info.schema_name));
        if diagram.has_class(&id) {
            return Some(id);
        }
        if !self.can_create(diagram) {
            return None;
        }
        debug!(reference = info.raw.as_str(), "Unresolved reference");
        let class = Class::new(&id, info.schema_name.clone())
            .with_annotation("unresolved")
            .with_metadata("ref", info.raw.clone());
        Some(self.finish_class(diagram, class))
    }
}
