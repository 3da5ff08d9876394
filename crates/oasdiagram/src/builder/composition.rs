//! Composition handling
//!
//! Schema-level unions become an `<<interface>>` placeholder with one
//! inheritance edge per variant. Schema-level `allOf` is flattened into a
//! single class that inherits from its referenced (or titled) members.

use std::collections::HashSet;

use tracing::trace;

use crate::analysis::DiscriminatorInfo;
use crate::identifier::{component_schema_name, sanitize_id, Location};
use crate::model::{Class, ClassDiagram, ClassKind, Property, Relationship, RelationshipKind};
use crate::openapi::{Schema, SchemaResolver};

use super::property::{determine_property_type, union_type_string};
use super::schema::queue_properties;
use super::DiagramBuilder;

/// Recursion cap when looking up an inherited property's schema
const MAX_LOOKUP_DEPTH: usize = 16;

/// Schema of property `name` in `schema` or its `allOf` chain, with the
/// `required` list that applies to it
fn find_property<'s>(
    schema: &'s Schema,
    name: &str,
    resolver: &'s dyn SchemaResolver,
    depth: usize,
) -> Option<(&'s Schema, &'s [String])> {
    if depth > MAX_LOOKUP_DEPTH {
        return None;
    }
    let schema = resolver.resolve_chain(schema)?;
    if let Some(property) = schema.properties.get(name) {
        return Some((property, &schema.required));
    }
    schema
        .all_of
        .iter()
        .find_map(|member| find_property(member, name, resolver, depth + 1))
}

impl<'a> DiagramBuilder<'a> {
    /// `<ID>_Choice` / `<ID>_Union` placeholder for a schema-level union
    pub(super) fn create_placeholder(
        &mut self,
        diagram: &mut ClassDiagram,
        schema: &'a Schema,
        id: &str,
        location: &Location,
        keyword: &'static str,
        variants: &'a [Schema],
    ) -> String {
        let suffix = if keyword == "oneOf" { "Choice" } else { "Union" };
        let placeholder = sanitize_id(&format!("{}_{}", id, suffix));
        self.state
            .representatives
            .insert(location.path.clone(), placeholder.clone());

        let base_label = schema
            .title()
            .or_else(|| component_schema_name(&location.path))
            .unwrap_or(id);
        let mut class = self
            .new_class(&placeholder, &format!("{}_{}", base_label, suffix), location)
            .with_kind(ClassKind::Interface)
            .with_annotation("interface");
        self.decorate(&mut class, schema);
        class.add_property(
            Property::new(format!("({})", keyword), union_type_string(variants)).with_required(true),
        );

        let discriminator = if self.config.schema.show_discriminators {
            self.discriminators.analyze(id, schema, self.document)
        } else {
            None
        };
        if let Some(info) = &discriminator {
            class
                .metadata
                .insert("discriminator".to_string(), info.property_name.clone());
            if !info.mapping.is_empty() {
                let mapping: Vec<String> = info
                    .mapping
                    .iter()
                    .map(|(value, target)| format!("{}={}", value, target))
                    .collect();
                class.metadata.insert("mapping".to_string(), mapping.join(", "));
            }
        }

        self.state.in_progress.push(placeholder.clone());
        for (index, variant) in variants.iter().enumerate() {
            if variant.is_simple_scalar() {
                trace!(placeholder = placeholder.as_str(), index, "Scalar variant");
                continue;
            }
            let variant_location = location.child(keyword, id).indexed(index, id);
            let target = match variant.reference_path() {
                Some(reference) => self.visit_reference(diagram, reference, Some(&placeholder)),
                None => {
                    let forced = if variant.title().is_some() && self.config.render_titled_inline_schema {
                        None
                    } else {
                        Some(sanitize_id(&format!("{}_{}_{}", id, keyword, index)))
                    };
                    let target = self.visit_schema_as(diagram, variant, &variant_location, forced);
                    self.state.owned.insert(variant_location.path);
                    target
                }
            };
            let Some(target) = target else {
                continue;
            };

            let mut edge = Relationship::new(&placeholder, &target, RelationshipKind::Inheritance);
            if let Some(info) = &discriminator {
                let values = info.values_for(&target);
                if !values.is_empty() {
                    edge = edge.with_metadata("discriminatorValues", values.join(","));
                    tag_variant(diagram, &target, info, values);
                }
            }
            self.link(diagram, edge, variant.reference_path());
        }
        self.state.in_progress.pop();
        self.finish_class(diagram, class)
    }

    /// One class for a schema-level `allOf`
    ///
    /// Referenced members (and titled inline members) become bases linked by
    /// `extends`; their properties are not copied. Other inline members are
    /// absorbed and contribute their own properties.
    pub(super) fn flatten_all_of(
        &mut self,
        diagram: &mut ClassDiagram,
        schema: &'a Schema,
        id: &str,
        location: &Location,
    ) -> String {
        let label = schema
            .title()
            .or_else(|| component_schema_name(&location.path))
            .unwrap_or(id)
            .to_string();
        let mut class = self.new_class(id, &label, location);
        self.decorate(&mut class, schema);
        self.state.in_progress.push(id.to_string());

        let mut bases: Vec<(String, Option<&'a str>)> = Vec::new();
        let mut pending = Vec::new();
        let mut seen = HashSet::new();

        for (index, member) in schema.all_of.iter().enumerate() {
            let member_location = location.child("allOf", id).indexed(index, id);

            if let Some(reference) = member.reference_path() {
                if let Some(base) = self.visit_reference(diagram, reference, Some(id)) {
                    bases.push((base, Some(reference)));
                }
                continue;
            }

            if member.title().is_some() && self.config.render_titled_inline_schema {
                if let Some(base) = self.visit_schema(diagram, member, &member_location) {
                    bases.push((base, None));
                }
                self.state.owned.insert(member_location.path);
                continue;
            }

            self.state.visited.insert(member_location.path.clone());
            self.state.owned.insert(member_location.path.clone());
            self.state
                .representatives
                .insert(member_location.path.clone(), id.to_string());
            let mut required = member.required.clone();
            required.extend(schema.required.iter().cloned());
            queue_properties(
                &mut pending,
                &mut seen,
                &member.properties,
                &required,
                &member_location,
                id,
            );
        }
        queue_properties(&mut pending, &mut seen, &schema.properties, &schema.required, location, id);
        self.emit_properties(diagram, &mut class, id, pending);

        if self.config.schema.inherited_properties {
            self.add_inherited(&mut class, id, schema, &bases);
        }
        self.mark_discriminator(&mut class, schema);

        for (base, reference) in &bases {
            self.link(
                diagram,
                Relationship::new(base, id, RelationshipKind::Inheritance).with_label("extends"),
                *reference,
            );
        }

        self.state.in_progress.pop();
        self.finish_class(diagram, class)
    }

    /// List properties inherited from bases as `<name> (inherited)`
    fn add_inherited(
        &self,
        class: &mut Class,
        id: &str,
        schema: &'a Schema,
        bases: &[(String, Option<&'a str>)],
    ) {
        let document = self.document;
        let sources = self.inheritance.analyze(id, schema, document);
        for source in sources.values().filter(|s| s.inherited) {
            if !bases.iter().any(|(base, _)| *base == source.source_schema) {
                continue;
            }
            if class.has_property_named(&source.name) {
                continue;
            }
            let (type_string, required) = match schema
                .all_of
                .iter()
                .find_map(|member| find_property(member, &source.name, document, 0))
            {
                Some((property, required)) => (
                    determine_property_type(
                        property,
                        &source.name,
                        required,
                        self.config.relation.detect_polymorphism,
                    )
                    .type_string,
                    required.iter().any(|r| *r == source.name),
                ),
                None => ("any?".to_string(), false),
            };
            class.add_property(
                Property::new(format!("{} (inherited)", source.name), type_string)
                    .with_required(required),
            );
        }
    }
}

/// Record discriminator values on a variant class that already exists
fn tag_variant(diagram: &mut ClassDiagram, target: &str, info: &DiscriminatorInfo, values: Vec<String>) {
    let Some(class) = diagram.get_class_mut(target) else {
        return;
    };
    for property in &mut class.properties {
        if property.name.split(" (").next() == Some(info.property_name.as_str()) {
            property.is_discriminator = true;
            property.discriminator_values = values.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::openapi::OpenApi;

    fn build(schemas: &str, config: &Config) -> ClassDiagram {
        let yaml = format!(
            "openapi: 3.0.3\ninfo: {{title: t, version: '1'}}\ncomponents:\n  schemas:\n{}",
            schemas
        );
        let document: OpenApi = serde_yaml::from_str(&yaml).unwrap();
        DiagramBuilder::new(&document, config).build_schemas()
    }

    fn edge<'d>(diagram: &'d ClassDiagram, source: &str, target: &str) -> Option<&'d Relationship> {
        diagram
            .relationships()
            .iter()
            .find(|r| r.source == source && r.target == target)
    }

    const PAY: &str = "    Pay:\n      oneOf:\n        - $ref: '#/components/schemas/Succ'\n        - $ref: '#/components/schemas/Pend'\n      discriminator: {propertyName: status}\n    Succ:\n      properties:\n        status: {type: string, enum: [succeeded]}\n    Pend:\n      properties:\n        status: {type: string, enum: [pending]}\n";

    #[test]
    fn test_union_placeholder() {
        let diagram = build(PAY, &Config::default());

        let choice = diagram.get_class("Pay_Choice").unwrap();
        assert!(choice.has_annotation("interface"));
        assert_eq!(choice.kind, ClassKind::Interface);
        assert_eq!(choice.properties[0].name, "(oneOf)");
        assert_eq!(choice.properties[0].property_type, "Succ | Pend");
        assert!(!diagram.has_class("Pay"));

        let succ = edge(&diagram, "Pay_Choice", "Succ").unwrap();
        assert_eq!(succ.kind, RelationshipKind::Inheritance);
        assert_eq!(
            succ.metadata.get("discriminatorValues").map(String::as_str),
            Some("succeeded")
        );
        assert!(edge(&diagram, "Pay_Choice", "Pend").is_some());

        let status = &diagram.get_class("Pend").unwrap().properties[0];
        assert!(status.is_discriminator);
        assert_eq!(status.discriminator_values, vec!["pending"]);
    }

    #[test]
    fn test_refs_to_union_land_on_placeholder() {
        let schemas = format!(
            "{}    Order:\n      properties:\n        payment: {{$ref: '#/components/schemas/Pay'}}\n",
            PAY
        );
        let diagram = build(&schemas, &Config::default());
        assert_eq!(
            edge(&diagram, "Order", "Pay_Choice").unwrap().label.as_deref(),
            Some("payment")
        );
    }

    #[test]
    fn test_inline_variants() {
        let schemas = "    Shape:\n      anyOf:\n        - {title: Circle, properties: {r: {type: number}}}\n        - {properties: {w: {type: number}}}\n        - {type: string}\n";
        let diagram = build(schemas, &Config::default());

        assert!(diagram.has_class("Shape_Union"));
        assert!(diagram.has_class("Circle"));
        assert!(diagram.has_class("Shape_anyOf_1"));
        assert_eq!(diagram.class_count(), 3);
        assert!(edge(&diagram, "Shape_Union", "Circle").is_some());
    }

    #[test]
    fn test_titled_variant_gets_indexed_id_when_disabled() {
        let schemas = "    Shape:\n      oneOf:\n        - {title: Circle, properties: {r: {type: number}}}\n        - {title: Square, properties: {s: {type: number}}}\n";
        let mut config = Config::default();
        config.render_titled_inline_schema = false;
        let diagram = build(schemas, &config);
        assert!(diagram.has_class("Shape_oneOf_0"));
        assert!(diagram.has_class("Shape_oneOf_1"));
        assert!(!diagram.has_class("Circle"));
    }

    #[test]
    fn test_titled_inline_all_of() {
        let schemas = "    Ext:\n      allOf:\n        - {title: Base, type: object, properties: {id: {type: string}}}\n        - {title: Extras, type: object, properties: {notes: {type: string}}}\n";
        let diagram = build(schemas, &Config::default());

        assert_eq!(diagram.class_count(), 3);
        assert!(diagram.get_class("Ext").unwrap().properties.is_empty());
        for base in ["Base", "Extras"] {
            let e = edge(&diagram, base, "Ext").unwrap();
            assert_eq!(e.kind, RelationshipKind::Inheritance);
            assert_eq!(e.label.as_deref(), Some("extends"));
        }
    }

    #[test]
    fn test_extension_copies_only_inline_properties() {
        let schemas = "    Base:\n      properties:\n        id: {type: string}\n    Dog:\n      allOf:\n        - $ref: '#/components/schemas/Base'\n        - properties:\n            bark: {type: boolean}\n      properties:\n        name: {type: string}\n";
        let diagram = build(schemas, &Config::default());

        let dog = diagram.get_class("Dog").unwrap();
        let names: Vec<_> = dog.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["bark", "name"]);
        assert!(edge(&diagram, "Base", "Dog").is_some());
        assert!(!diagram.has_class("Dog_allOf_1"));
    }

    #[test]
    fn test_inherited_properties_listed_when_enabled() {
        let schemas = "    Base:\n      required: [id]\n      properties:\n        id: {type: string}\n    Dog:\n      allOf:\n        - $ref: '#/components/schemas/Base'\n        - properties:\n            bark: {type: boolean}\n";
        let mut config = Config::default();
        config.schema.inherited_properties = true;
        let diagram = build(schemas, &config);

        let dog = diagram.get_class("Dog").unwrap();
        let inherited = dog.get_property("id (inherited)").unwrap();
        assert_eq!(inherited.property_type, "string");
        assert!(inherited.required);
    }
}
