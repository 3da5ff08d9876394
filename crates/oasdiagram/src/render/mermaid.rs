//! Class diagram text renderer
//!
//! Output is the Mermaid `classDiagram` dialect: a header line, one block
//! per class in insertion order, then one line per relationship.

use std::fmt::Write as _;

use anyhow::Result;
use indexmap::IndexMap;
use tracing::{debug, span, Level};

use crate::analysis::constraint_markers;
use crate::core::{Config, Renderer};
use crate::identifier::sanitize_id;
use crate::model::{Class, ClassDiagram, ClassKind, Method, Property, Relationship, Visibility};

/// Renders a [`ClassDiagram`] as Mermaid class diagram text
#[derive(Debug, Clone, Copy, Default)]
pub struct MermaidRenderer;

/// Top-level unit of output: a lone class or a namespace group
enum Block<'d> {
    Class(&'d Class),
    Namespace(&'d str, Vec<&'d Class>),
}

impl MermaidRenderer {
    pub fn new() -> Self {
        Self
    }

    fn blocks<'d>(&self, diagram: &'d ClassDiagram) -> Vec<Block<'d>> {
        if !diagram.config().use_namespaces {
            return diagram.classes().iter().map(Block::Class).collect();
        }
        let mut blocks = Vec::new();
        let mut groups: IndexMap<&str, usize> = IndexMap::new();
        for class in diagram.classes() {
            match class.namespace.as_deref() {
                None => blocks.push(Block::Class(class)),
                Some(namespace) => match groups.get(namespace) {
                    Some(&index) => {
                        if let Block::Namespace(_, members) = &mut blocks[index] {
                            members.push(class);
                        }
                    }
                    None => {
                        groups.insert(namespace, blocks.len());
                        blocks.push(Block::Namespace(namespace, vec![class]));
                    }
                },
            }
        }
        blocks
    }

    fn write_class(&self, out: &mut String, class: &Class, config: &Config, indent: &str) {
        let id = sanitize_id(&class.id);
        let _ = writeln!(out, "{indent}  class {id} {{");

        let mut annotations: Vec<&str> = class.annotations.iter().map(String::as_str).collect();
        if class.kind == ClassKind::Abstract && !class.has_annotation("abstract") {
            annotations.push("abstract");
        }
        for annotation in annotations {
            let _ = writeln!(out, "{indent}    <<{annotation}>>");
        }

        let visible: Vec<&Property> = class
            .properties
            .iter()
            .filter(|p| config.include_private || p.visibility != Visibility::Private)
            .collect();
        let max = config.max_properties();
        let already_truncated = visible.last().is_some_and(|p| p.is_truncation());
        let shown = if max > 0 && visible.len() > max && !already_truncated {
            max
        } else {
            visible.len()
        };
        for property in &visible[..shown] {
            let _ = writeln!(out, "{indent}    {}", self.property_line(property, config));
        }
        if shown < visible.len() {
            let _ = writeln!(out, "{indent}    ... +{} more properties", visible.len() - shown);
        }

        for method in &class.methods {
            let _ = writeln!(out, "{indent}    {}", self.method_line(method));
        }
        let _ = writeln!(out, "{indent}  }}");
    }

    /// `<vis><type> <name>[ <<markers>>][ = default]`
    pub fn property_line(&self, property: &Property, config: &Config) -> String {
        if property.is_truncation() {
            return property.name.clone();
        }
        let mut line = String::new();
        line.push(property.visibility.to_char());
        if !property.property_type.is_empty() {
            line.push_str(&property.property_type);
            line.push(' ');
        }
        line.push_str(&property.name);

        let mut markers = Vec::new();
        if config.schema.show_constraints {
            if let Some(constraints) = &property.constraints {
                markers.extend(
                    constraint_markers(constraints)
                        .into_iter()
                        .filter(|m| !property.name.contains(&format!("({})", m))),
                );
            }
        }
        if property.is_discriminator && config.schema.show_discriminators {
            markers.push("discriminator".to_string());
        }
        if !markers.is_empty() {
            let _ = write!(line, " <<{}>>", markers.join(", "));
        }
        if let Some(default) = &property.default {
            let _ = write!(line, " = {}", default);
        }
        line
    }

    /// `<vis><name>(<params>) <ret>`
    pub fn method_line(&self, method: &Method) -> String {
        let mut line = format!("{}{}({})", method.visibility.to_char(), method.name, method.parameters);
        if !method.return_type.is_empty() {
            line.push(' ');
            line.push_str(&method.return_type);
        }
        line
    }

    /// One relationship line, without indentation
    pub fn relationship_line(&self, relationship: &Relationship, show_cardinality: bool) -> String {
        let source = sanitize_id(&relationship.source);
        let target = sanitize_id(&relationship.target);
        let arrow = relationship.kind.arrow();
        let cardinality = relationship
            .cardinality
            .as_deref()
            .filter(|c| show_cardinality && !c.is_empty());
        let label = relationship.label.as_deref().filter(|l| !l.is_empty());

        match (label, cardinality) {
            (Some(label), Some(cardinality)) => {
                format!("{source} {arrow} {target} : {label} {cardinality}")
            }
            (Some(label), None) => format!("{source} {arrow} {target} : {label}"),
            (None, Some(cardinality)) => format!("{source} \"{cardinality}\" {arrow} {target}"),
            (None, None) => format!("{source} {arrow} {target}"),
        }
    }
}

impl Renderer<ClassDiagram> for MermaidRenderer {
    type Output = String;

    fn render(&self, diagram: &ClassDiagram) -> Result<String> {
        let render_span = span!(
            Level::DEBUG,
            "render_mermaid",
            classes = diagram.class_count(),
            relationships = diagram.relationship_count()
        );
        let _enter = render_span.enter();

        let config = diagram.config();
        let mut out = String::from("classDiagram\n");

        for block in self.blocks(diagram) {
            match block {
                Block::Class(class) => self.write_class(&mut out, class, config, ""),
                Block::Namespace(namespace, classes) => {
                    let _ = writeln!(out, "  namespace {} {{", sanitize_id(namespace));
                    for class in classes {
                        self.write_class(&mut out, class, config, "  ");
                    }
                    out.push_str("  }\n");
                }
            }
        }

        let show_cardinality = config.cardinality_enabled();
        for relationship in diagram.relationships() {
            let _ = writeln!(out, "  {}", self.relationship_line(relationship, show_cardinality));
        }

        debug!(output_len = out.len(), "Mermaid rendering completed");
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "mermaid"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn format(&self) -> &'static str {
        "mermaid"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PropertyConstraints, RelationshipKind};

    fn render(diagram: &ClassDiagram) -> String {
        MermaidRenderer::new().render(diagram).unwrap()
    }

    #[test]
    fn test_empty_diagram_is_header_only() {
        assert_eq!(render(&ClassDiagram::new()), "classDiagram\n");
    }

    #[test]
    fn test_class_block() {
        let mut diagram = ClassDiagram::new();
        let mut pet = Class::new("Pet", "Pet").with_annotation("deprecated");
        pet.add_property(Property::new("id", "integer").with_required(true));
        pet.add_property(Property::new("name", "string?").with_default("\"rex\""));
        pet.add_method(Method::new("get").with_parameters("limit").with_return_type("Pet[]"));
        diagram.add_class(pet);

        let expected = "classDiagram\n  class Pet {\n    <<deprecated>>\n    +integer id\n    +string? name = \"rex\"\n    +get(limit) Pet[]\n  }\n";
        assert_eq!(render(&diagram), expected);
    }

    #[test]
    fn test_abstract_kind_adds_annotation() {
        let mut diagram = ClassDiagram::new();
        diagram.add_class(Class::new("Base", "Base").with_kind(ClassKind::Abstract));
        assert!(render(&diagram).contains("    <<abstract>>\n"));
    }

    #[test]
    fn test_private_properties_hidden_when_excluded() {
        let mut config = Config::default();
        config.include_private = false;
        let mut diagram = ClassDiagram::with_config(config);
        let mut class = Class::new("User", "User");
        class.add_property(Property::new("password", "string").with_visibility(Visibility::Private));
        class.add_property(Property::new("email", "string"));
        diagram.add_class(class);

        let output = render(&diagram);
        assert!(!output.contains("password"));
        assert!(output.contains("+string email"));
    }

    #[test]
    fn test_truncation_line() {
        let mut config = Config::default();
        config.schema.max_properties = 2;
        let mut diagram = ClassDiagram::with_config(config);
        let mut class = Class::new("Wide", "Wide");
        for name in ["a", "b", "c", "d"] {
            class.add_property(Property::new(name, "string"));
        }
        diagram.add_class(class);

        let output = render(&diagram);
        assert!(output.contains("+string b\n    ... +2 more properties\n"));
        assert!(!output.contains("+string c"));
    }

    #[test]
    fn test_builder_truncation_not_repeated() {
        let mut config = Config::default();
        config.schema.max_properties = 1;
        let mut diagram = ClassDiagram::with_config(config);
        let mut class = Class::new("Wide", "Wide");
        class.add_property(Property::new("a", "string"));
        class.add_property(Property::truncation(3));
        diagram.add_class(class);

        let output = render(&diagram);
        assert!(!output.contains("more properties"));
        assert!(output.contains("    ... +3 more\n"));
    }

    #[test]
    fn test_constraint_and_discriminator_markers() {
        let mut diagram = ClassDiagram::new();
        let mut class = Class::new("Pet", "Pet");
        let constraints = PropertyConstraints {
            min_length: Some(1),
            max_length: Some(64),
            ..PropertyConstraints::default()
        };
        class.add_property(Property::new("name", "string").with_constraints(Some(constraints)));
        let mut kind = Property::new("kind", "string");
        kind.is_discriminator = true;
        class.add_property(kind);
        diagram.add_class(class);

        let output = render(&diagram);
        assert!(output.contains("+string name <<length:1..64>>"));
        assert!(output.contains("+string kind <<discriminator>>"));
    }

    #[test]
    fn test_relationship_formats() {
        let renderer = MermaidRenderer::new();
        let both = Relationship::new("Order", "OrderItem", RelationshipKind::Composition)
            .with_label("items")
            .with_cardinality("0..*");
        assert_eq!(renderer.relationship_line(&both, true), "Order *-- OrderItem : items 0..*");
        assert_eq!(renderer.relationship_line(&both, false), "Order *-- OrderItem : items");

        let card_only = Relationship::new("A", "B", RelationshipKind::Aggregation).with_cardinality("1");
        assert_eq!(renderer.relationship_line(&card_only, true), "A \"1\" o-- B");

        let bare = Relationship::new("A", "B", RelationshipKind::Negation);
        assert_eq!(renderer.relationship_line(&bare, true), "A -.x B");

        let unsanitized = Relationship::new("a-b", "200", RelationshipKind::Dependency);
        assert_eq!(renderer.relationship_line(&unsanitized, true), "a_b ..> C_200");
    }

    #[test]
    fn test_classes_keep_insertion_order() {
        let mut diagram = ClassDiagram::new();
        for id in ["Zeta", "Alpha", "Mid"] {
            diagram.add_class(Class::new(id, id));
        }
        let output = render(&diagram);
        let zeta = output.find("class Zeta").unwrap();
        let alpha = output.find("class Alpha").unwrap();
        let mid = output.find("class Mid").unwrap();
        assert!(zeta < alpha && alpha < mid);
    }

    #[test]
    fn test_namespace_groups() {
        let mut config = Config::default();
        config.use_namespaces = true;
        let mut diagram = ClassDiagram::with_config(config);
        let mut pet = Class::new("Pet", "Pet");
        pet.namespace = Some("components".to_string());
        let mut list = Class::new("ListPets", "listPets");
        list.namespace = Some("pets".to_string());
        let mut tag = Class::new("Tag", "Tag");
        tag.namespace = Some("components".to_string());
        diagram.add_class(Class::new("Document", "Document"));
        diagram.add_class(pet);
        diagram.add_class(list);
        diagram.add_class(tag);

        let output = render(&diagram);
        let expected = "classDiagram\n  class Document {\n  }\n  namespace components {\n    class Pet {\n    }\n    class Tag {\n    }\n  }\n  namespace pets {\n    class ListPets {\n    }\n  }\n";
        assert_eq!(output, expected);
    }
}
