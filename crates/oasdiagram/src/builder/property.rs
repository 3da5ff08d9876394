//! Property processing
//!
//! One place decides a property's display name, its type string and the
//! edges it implies. The type decision is a pure function so it can be
//! checked without building a diagram.

use tracing::trace;

use crate::analysis::{
    determine_visibility, extract_constraints, format_value, generate_type_string, parse_ref,
    EnumInfo,
};
use crate::identifier::{sanitize_id, Location};
use crate::model::{ClassDiagram, Property, Relationship, RelationshipKind};
use crate::openapi::Schema;

use super::DiagramBuilder;

/// Classified type of a property
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyTypeResult {
    pub type_string: String,
    pub is_ref: bool,
    pub is_array: bool,
    pub is_all_of: bool,
    /// References the property points at directly or through its variants
    pub ref_paths: Vec<String>,
    /// Reference of the array items, if they are a `$ref`
    pub item_ref_path: Option<String>,
}

/// Type name for a reference: the sanitized schema name it points at
fn ref_type_name(reference: &str) -> String {
    sanitize_id(&parse_ref(reference).schema_name)
}

/// Name of one union variant: schema name, title, first type, or `object`
fn variant_type_name(variant: &Schema) -> String {
    if let Some(reference) = variant.reference_path() {
        return ref_type_name(reference);
    }
    if let Some(title) = variant.title() {
        return title.to_string();
    }
    variant.primary_type().unwrap_or("object").to_string()
}

/// `A | B | C` for the variants of a union
pub fn union_type_string(variants: &[Schema]) -> String {
    variants
        .iter()
        .map(variant_type_name)
        .collect::<Vec<_>>()
        .join(" | ")
}

fn optional(mut type_string: String, required: bool) -> String {
    if !required {
        type_string.push('?');
    }
    type_string
}

fn ref_paths(schemas: &[Schema]) -> Vec<String> {
    schemas
        .iter()
        .filter_map(Schema::reference_path)
        .map(str::to_string)
        .collect()
}

/// Classify the property `name` and build its type string
///
/// Checks, in order: direct reference, array, `oneOf` and `anyOf` with two
/// or more variants, the single-reference union (always optional),
/// property-level `allOf`, and finally the plain type string. With
/// `detect_polymorphism` off, multi-variant unions fall through to the plain
/// type string.
pub fn determine_property_type(
    schema: &Schema,
    name: &str,
    required: &[String],
    detect_polymorphism: bool,
) -> PropertyTypeResult {
    let is_required = required.iter().any(|r| r == name);

    if let Some(reference) = schema.reference_path() {
        return PropertyTypeResult {
            type_string: optional(ref_type_name(reference), is_required),
            is_ref: true,
            ref_paths: vec![reference.to_string()],
            ..PropertyTypeResult::default()
        };
    }

    if schema.is_array() {
        let item_ref_path = schema
            .items
            .as_deref()
            .and_then(Schema::reference_path)
            .map(str::to_string);
        let base = match &item_ref_path {
            Some(reference) => format!("{}[]", ref_type_name(reference)),
            None => generate_type_string(schema, name, required),
        };
        return PropertyTypeResult {
            type_string: optional(base, is_required),
            is_array: true,
            item_ref_path,
            ..PropertyTypeResult::default()
        };
    }

    if detect_polymorphism {
        for variants in [&schema.one_of, &schema.any_of] {
            if variants.len() >= 2 {
                return PropertyTypeResult {
                    type_string: optional(union_type_string(variants), is_required),
                    ref_paths: ref_paths(variants),
                    ..PropertyTypeResult::default()
                };
            }
        }
    }

    if let Some((_, [only])) = schema.union_variants() {
        if let Some(reference) = only.reference_path() {
            return PropertyTypeResult {
                type_string: format!("{}?", ref_type_name(reference)),
                is_ref: true,
                ref_paths: vec![reference.to_string()],
                ..PropertyTypeResult::default()
            };
        }
    }

    if !schema.all_of.is_empty() {
        return PropertyTypeResult {
            type_string: optional("allOf".to_string(), is_required),
            is_all_of: true,
            ref_paths: ref_paths(&schema.all_of),
            ..PropertyTypeResult::default()
        };
    }

    PropertyTypeResult {
        type_string: generate_type_string(schema, name, required),
        ..PropertyTypeResult::default()
    }
}

/// Property name with its markers: enum, `(readOnly)`, `(writeOnly)`,
/// `(deprecated)`, then `(format:<f>)`
pub fn build_property_display_name(
    base: &str,
    schema: &Schema,
    enum_annotation: Option<&str>,
    show_format: bool,
) -> String {
    let mut parts = vec![base.to_string()];
    if let Some(annotation) = enum_annotation {
        parts.push(annotation.to_string());
    }
    if schema.read_only {
        parts.push("(readOnly)".to_string());
    }
    if schema.write_only {
        parts.push("(writeOnly)".to_string());
    }
    if schema.deprecated {
        parts.push("(deprecated)".to_string());
    }
    if show_format {
        if let Some(format) = extract_constraints(schema).and_then(|c| c.format) {
            parts.push(format!("(format:{})", format));
        }
    }
    parts.join(" ")
}

impl<'a> DiagramBuilder<'a> {
    /// Build property `name` of class `parent_id` and emit its edges
    ///
    /// `location` is the JSON location of the property schema itself.
    pub(super) fn process_property(
        &mut self,
        diagram: &mut ClassDiagram,
        parent_id: &str,
        name: &str,
        schema: &'a Schema,
        required: &[String],
        location: &Location,
    ) -> Property {
        let is_required = required.iter().any(|r| r == name);
        let optional_unless_nullable = !is_required && !schema.is_nullable();
        let owner = sanitize_id(&format!("{}_{}", parent_id, name));

        let mut result = determine_property_type(
            schema,
            name,
            required,
            self.config.relation.detect_polymorphism,
        );
        if !self.config.relation.analyze_property_types {
            result.type_string = generate_type_string(schema, name, required);
        }

        let mut enum_annotation = None;
        if self.config.schema.show_enums && !schema.is_ref() {
            if let Some(info) = self.enums.analyze_enum(schema, name) {
                if self.enums.should_render_as_class() {
                    if let Some(enum_id) = self.enum_class(diagram, &owner, &info, location) {
                        result.type_string = optional(enum_id.clone(), !optional_unless_nullable);
                        diagram.add_relationship(
                            Relationship::new(parent_id, &enum_id, RelationshipKind::Association)
                                .with_label(name),
                        );
                    }
                } else {
                    enum_annotation = Some(self.enums.property_annotation(&info));
                }
            }
        }

        let inline_object = !schema.is_ref()
            && !result.is_array
            && !schema.has_composition()
            && !schema.properties.is_empty();
        if inline_object {
            if let Some(nested_id) = self.visit_nested(diagram, schema, location, &owner) {
                if self.config.relation.analyze_property_types {
                    result.type_string = optional(nested_id.clone(), !optional_unless_nullable);
                }
                diagram.add_relationship(
                    Relationship::new(parent_id, &nested_id, RelationshipKind::Composition)
                        .with_label(name),
                );
            }
        }

        let inline_item = self.property_relationships(
            diagram, parent_id, name, schema, &result, location, &owner,
        );
        if let Some(item_id) = inline_item {
            if self.config.relation.analyze_property_types {
                result.type_string = optional(format!("{}[]", item_id), is_required);
            }
        }

        let constraints = if self.config.schema.show_constraints {
            extract_constraints(schema)
        } else {
            None
        };

        Property {
            name: build_property_display_name(
                name,
                schema,
                enum_annotation.as_deref(),
                self.config.schema.show_format,
            ),
            property_type: result.type_string,
            visibility: determine_visibility(name, schema, required),
            required: is_required,
            read_only: schema.read_only,
            write_only: schema.write_only,
            deprecated: schema.deprecated,
            nullable: schema.is_nullable(),
            default: schema.default.as_ref().map(format_value),
            constraints,
            is_discriminator: false,
            discriminator_values: Vec::new(),
        }
    }

    /// Emit the edges of one property
    ///
    /// Returns the ID of an inline array item class when one was created, so
    /// the caller can use it as the item type.
    #[allow(clippy::too_many_arguments)]
    fn property_relationships(
        &mut self,
        diagram: &mut ClassDiagram,
        parent_id: &str,
        name: &str,
        schema: &'a Schema,
        result: &PropertyTypeResult,
        location: &Location,
        owner: &str,
    ) -> Option<String> {
        if self.config.relation.detect_polymorphism {
            for (keyword, variants) in [("oneOf", &schema.one_of), ("anyOf", &schema.any_of)] {
                if variants.len() < 2 {
                    continue;
                }
                for (index, variant) in variants.iter().enumerate() {
                    if variant.is_simple_scalar() {
                        continue;
                    }
                    let variant_location = location.child(keyword, owner).indexed(index, owner);
                    let target = self.visit_member(
                        diagram,
                        variant,
                        &variant_location,
                        parent_id,
                        keyword,
                        index,
                        owner,
                    );
                    if let Some(target) = target {
                        self.link(
                            diagram,
                            Relationship::new(parent_id, &target, RelationshipKind::Association).with_label(name),
                            variant.reference_path(),
                        );
                    }
                }
            }
        }

        if result.is_all_of {
            for (index, member) in schema.all_of.iter().enumerate() {
                let member_location = location.child("allOf", owner).indexed(index, owner);
                let target = self.visit_member(
                    diagram,
                    member,
                    &member_location,
                    parent_id,
                    "allOf",
                    index,
                    owner,
                );
                if let Some(target) = target {
                    self.link(
                        diagram,
                        Relationship::new(parent_id, &target, RelationshipKind::Composition).with_label(name),
                        member.reference_path(),
                    );
                }
            }
        }

        if result.is_ref {
            if let Some(reference) = result.ref_paths.first() {
                if let Some(target) = self.visit_reference(diagram, reference, Some(parent_id)) {
                    self.link(
                        diagram,
                        Relationship::new(parent_id, &target, RelationshipKind::Composition).with_label(name),
                        Some(reference),
                    );
                }
            }
        }

        let mut inline_item = None;
        if result.is_array {
            let items = schema.items.as_deref();
            let target = match (&result.item_ref_path, items) {
                (Some(reference), _) => self.visit_reference(diagram, reference, Some(parent_id)),
                (None, Some(items)) if items.title().is_some() || !items.properties.is_empty() => {
                    let item_id = self.visit_nested(diagram, items, &location.child("items", owner), owner);
                    inline_item = item_id.clone();
                    item_id
                }
                _ => None,
            };
            if let Some(target) = target {
                let mut edge = Relationship::new(parent_id, &target, RelationshipKind::Composition).with_label(name);
                if self.config.cardinality_enabled() {
                    edge = edge.with_cardinality("0..*");
                }
                self.link(diagram, edge, result.item_ref_path.as_deref());
            }
        }

        if let Some(extra) = schema.additional_properties.as_ref().and_then(|a| a.as_schema()) {
            if let Some(reference) = extra.reference_path() {
                if let Some(target) = self.visit_reference(diagram, reference, Some(parent_id)) {
                    self.link(
                        diagram,
                        Relationship::new(parent_id, &target, RelationshipKind::Composition).with_label(name),
                        Some(reference),
                    );
                }
            }
        }

        inline_item
    }

    /// Visit a composition member of a property: references through their
    /// component, titled or object-shaped inline members as classes
    #[allow(clippy::too_many_arguments)]
    fn visit_member(
        &mut self,
        diagram: &mut ClassDiagram,
        member: &'a Schema,
        location: &Location,
        parent_id: &str,
        keyword: &str,
        index: usize,
        owner: &str,
    ) -> Option<String> {
        if let Some(reference) = member.reference_path() {
            return self.visit_reference(diagram, reference, Some(parent_id));
        }
        if member.title().is_some() && self.config.render_titled_inline_schema {
            return self.visit_schema(diagram, member, location);
        }
        if member.title().is_some() || !member.properties.is_empty() {
            let forced = sanitize_id(&format!("{}_{}_{}", owner, keyword, index));
            return self.visit_schema_as(diagram, member, location, Some(forced));
        }
        trace!(owner, keyword, index, "Skipping shapeless inline member");
        None
    }

    /// Promote an inline object to its own class, within the nesting cap
    fn visit_nested(
        &mut self,
        diagram: &mut ClassDiagram,
        schema: &'a Schema,
        location: &Location,
        owner: &str,
    ) -> Option<String> {
        if self.state.nesting >= self.config.schema_depth() {
            trace!(owner, "Inline nesting cap reached");
            return None;
        }
        self.state.nesting += 1;
        let id = self.visit_schema(diagram, schema, location);
        self.state.nesting -= 1;
        id
    }

    /// `<<enumeration>>` class for an inline enum property
    fn enum_class(
        &mut self,
        diagram: &mut ClassDiagram,
        owner: &str,
        info: &EnumInfo,
        location: &Location,
    ) -> Option<String> {
        let owner = self.schema_class_id(owner.to_string());
        if diagram.has_class(&owner) {
            return Some(owner);
        }
        if !self.can_create(diagram) {
            return None;
        }
        let mut class = self.enums.create_enum_class(info, &owner);
        class.namespace = self.namespace_for(&location.path);
        Some(self.finish_class(diagram, class))
    }

    /// Add an edge, tagging it when it points at an external reference
    pub(super) fn link(
        &self,
        diagram: &mut ClassDiagram,
        edge: Relationship,
        reference: Option<&str>,
    ) {
        let edge = match reference.map(parse_ref) {
            Some(info) if !info.is_local => self.external.annotate_edge(edge, &info),
            _ => edge,
        };
        diagram.add_relationship(edge);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(yaml: &str) -> Schema {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn required(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_direct_ref() {
        let result = determine_property_type(
            &schema("$ref: '#/components/schemas/Owner'"),
            "owner",
            &[],
            true,
        );
        assert!(result.is_ref);
        assert_eq!(result.type_string, "Owner?");
        assert_eq!(result.ref_paths, vec!["#/components/schemas/Owner"]);

        let result = determine_property_type(
            &schema("$ref: '#/components/schemas/Owner'"),
            "owner",
            &required(&["owner"]),
            true,
        );
        assert_eq!(result.type_string, "Owner");
    }

    #[test]
    fn test_array_of_ref() {
        let result = determine_property_type(
            &schema("type: array\nitems: {$ref: '#/components/schemas/OrderItem'}"),
            "items",
            &[],
            true,
        );
        assert!(result.is_array);
        assert_eq!(result.type_string, "OrderItem[]?");
        assert_eq!(
            result.item_ref_path.as_deref(),
            Some("#/components/schemas/OrderItem")
        );
    }

    #[test]
    fn test_array_of_scalars() {
        let result = determine_property_type(
            &schema("type: array\nitems: {type: string}\nminItems: 1"),
            "tags",
            &required(&["tags"]),
            true,
        );
        assert_eq!(result.type_string, "string[1..*][]");
        assert!(result.item_ref_path.is_none());
    }

    #[test]
    fn test_union_of_refs() {
        let result = determine_property_type(
            &schema(
                "oneOf:\n  - $ref: '#/components/schemas/Card'\n  - $ref: '#/components/schemas/BankAccount'",
            ),
            "source",
            &[],
            true,
        );
        assert_eq!(result.type_string, "Card | BankAccount?");
        assert!(!result.is_ref);
        assert_eq!(result.ref_paths.len(), 2);
    }

    #[test]
    fn test_union_variant_names() {
        let result = determine_property_type(
            &schema("anyOf:\n  - {type: string}\n  - {title: Pair, type: object}\n  - {}"),
            "value",
            &required(&["value"]),
            true,
        );
        assert_eq!(result.type_string, "string | Pair | object");
    }

    #[test]
    fn test_union_without_polymorphism() {
        let result = determine_property_type(
            &schema("oneOf:\n  - {type: string}\n  - {type: integer}"),
            "value",
            &[],
            false,
        );
        assert_eq!(result.type_string, "any?");
    }

    #[test]
    fn test_single_ref_union_is_always_optional() {
        let result = determine_property_type(
            &schema("anyOf: [{$ref: '#/components/schemas/Profile'}]\nnullable: true"),
            "profile",
            &required(&["profile"]),
            true,
        );
        assert!(result.is_ref);
        assert_eq!(result.type_string, "Profile?");
    }

    #[test]
    fn test_property_all_of() {
        let result = determine_property_type(
            &schema(
                "allOf:\n  - $ref: '#/components/schemas/LinksSelf'\n  - $ref: '#/components/schemas/LinksPagination'",
            ),
            "links",
            &[],
            true,
        );
        assert!(result.is_all_of);
        assert_eq!(result.type_string, "allOf?");
        assert_eq!(result.ref_paths.len(), 2);
    }

    #[test]
    fn test_plain_types() {
        let plain = determine_property_type(&schema("type: integer"), "age", &[], true);
        assert_eq!(plain.type_string, "integer?");
        let nullable = determine_property_type(&schema("type: string\nnullable: true"), "nick", &[], true);
        assert_eq!(nullable.type_string, "string");
    }

    #[test]
    fn test_external_ref_type_name() {
        let result = determine_property_type(
            &schema("$ref: 'common.yaml#/components/schemas/Money'"),
            "price",
            &required(&["price"]),
            true,
        );
        assert_eq!(result.type_string, "Money");
    }

    #[test]
    fn test_display_name_order() {
        let prop = schema("type: string\nformat: uuid\nreadOnly: true\ndeprecated: true");
        assert_eq!(
            build_property_display_name("id", &prop, Some("(enum:A,B)"), true),
            "id (enum:A,B) (readOnly) (deprecated) (format:uuid)"
        );
        assert_eq!(build_property_display_name("id", &prop, None, false), "id (readOnly) (deprecated)");
        assert_eq!(
            build_property_display_name("secret", &schema("writeOnly: true"), None, true),
            "secret (writeOnly)"
        );
    }
}
