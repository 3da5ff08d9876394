//! End-to-end schema scenarios
//!
//! Each test feeds a small document through the builder and checks the
//! classes, property types and relationships that come out.

use oasdiagram::builder::DiagramBuilder;
use oasdiagram::model::{ClassDiagram, Relationship, RelationshipKind};
use oasdiagram::openapi::OpenApi;
use oasdiagram::Config;

fn schemas(yaml: &str) -> ClassDiagram {
    let document: OpenApi = serde_yaml::from_str(&format!(
        "openapi: 3.0.3\ninfo: {{title: t, version: '1'}}\ncomponents:\n  schemas:\n{}",
        yaml
    ))
    .unwrap();
    let config = Config::default();
    DiagramBuilder::new(&document, &config).build_schemas()
}

fn find<'d>(
    diagram: &'d ClassDiagram,
    source: &str,
    target: &str,
    kind: RelationshipKind,
) -> Option<&'d Relationship> {
    diagram
        .relationships()
        .iter()
        .find(|r| r.source == source && r.target == target && r.kind == kind)
}

fn class_ids(diagram: &ClassDiagram) -> Vec<&str> {
    diagram.classes().iter().map(|c| c.id.as_str()).collect()
}

#[test]
fn test_property_level_one_of_with_two_refs() {
    let diagram = schemas(
        r#"    P:
      properties:
        source:
          oneOf:
            - $ref: '#/components/schemas/Card'
            - $ref: '#/components/schemas/BankAccount'
    Card:
      properties:
        number: {type: string}
    BankAccount:
      properties:
        iban: {type: string}
"#,
    );

    let mut ids = class_ids(&diagram);
    ids.sort_unstable();
    assert_eq!(ids, vec!["BankAccount", "Card", "P"]);

    let p = diagram.get_class("P").unwrap();
    assert_eq!(p.get_property("source").unwrap().property_type, "Card | BankAccount?");

    let card = find(&diagram, "P", "Card", RelationshipKind::Association).unwrap();
    assert_eq!(card.label.as_deref(), Some("source"));
    let bank = find(&diagram, "P", "BankAccount", RelationshipKind::Association).unwrap();
    assert_eq!(bank.label.as_deref(), Some("source"));
    assert!(!diagram.has_class("P_Choice"));
}

#[test]
fn test_schema_level_one_of_with_discriminator() {
    let diagram = schemas(
        r#"    Pay:
      oneOf:
        - $ref: '#/components/schemas/Succ'
        - $ref: '#/components/schemas/Pend'
      discriminator:
        propertyName: status
    Succ:
      properties:
        status: {type: string}
        receipt: {type: string}
    Pend:
      properties:
        status: {type: string}
"#,
    );

    let choice = diagram.get_class("Pay_Choice").unwrap();
    assert!(choice.has_annotation("interface"));
    assert!(choice.get_property("(oneOf)").is_some());
    assert!(find(&diagram, "Pay_Choice", "Succ", RelationshipKind::Inheritance).is_some());
    assert!(find(&diagram, "Pay_Choice", "Pend", RelationshipKind::Inheritance).is_some());
    assert!(!diagram.has_class("Pay"));
}

#[test]
fn test_inline_titled_all_of() {
    let diagram = schemas(
        r#"    Ext:
      allOf:
        - title: Base
          type: object
          properties:
            id: {type: string}
        - title: Extras
          type: object
          properties:
            notes: {type: string}
"#,
    );

    assert_eq!(diagram.class_count(), 3);
    for id in ["Ext", "Base", "Extras"] {
        assert!(diagram.has_class(id), "missing {}", id);
    }
    let base = find(&diagram, "Base", "Ext", RelationshipKind::Inheritance).unwrap();
    assert_eq!(base.label.as_deref(), Some("extends"));
    let extras = find(&diagram, "Extras", "Ext", RelationshipKind::Inheritance).unwrap();
    assert_eq!(extras.label.as_deref(), Some("extends"));
}

#[test]
fn test_nullable_single_ref() {
    let diagram = schemas(
        r#"    Acc:
      properties:
        profile:
          anyOf:
            - $ref: '#/components/schemas/Profile'
          nullable: true
    Profile:
      properties:
        avatar: {type: string}
"#,
    );

    assert!(diagram.has_class("Profile"));
    let acc = diagram.get_class("Acc").unwrap();
    assert_eq!(acc.get_property("profile").unwrap().property_type, "Profile?");
    let edge = find(&diagram, "Acc", "Profile", RelationshipKind::Composition).unwrap();
    assert_eq!(edge.label.as_deref(), Some("profile"));
}

#[test]
fn test_array_of_ref() {
    let diagram = schemas(
        r#"    Order:
      properties:
        items:
          type: array
          items: {$ref: '#/components/schemas/OrderItem'}
    OrderItem:
      properties:
        sku: {type: string}
"#,
    );

    let order = diagram.get_class("Order").unwrap();
    assert_eq!(order.get_property("items").unwrap().property_type, "OrderItem[]?");
    let edge = find(&diagram, "Order", "OrderItem", RelationshipKind::Composition).unwrap();
    assert_eq!(edge.label.as_deref(), Some("items"));
    assert_eq!(edge.cardinality.as_deref(), Some("0..*"));
}

#[test]
fn test_property_level_all_of() {
    let diagram = schemas(
        r#"    R:
      properties:
        links:
          allOf:
            - $ref: '#/components/schemas/LinksSelf'
            - $ref: '#/components/schemas/LinksPagination'
    LinksSelf:
      properties:
        self: {type: string}
    LinksPagination:
      properties:
        next: {type: string}
"#,
    );

    let r = diagram.get_class("R").unwrap();
    assert_eq!(r.get_property("links").unwrap().property_type, "allOf?");
    for target in ["LinksSelf", "LinksPagination"] {
        let edge = find(&diagram, "R", target, RelationshipKind::Composition).unwrap();
        assert_eq!(edge.label.as_deref(), Some("links"));
    }
    assert!(diagram
        .classes()
        .iter()
        .all(|c| !c.id.ends_with("_Choice") && !c.id.ends_with("_Union")));
}

#[test]
fn test_revisit_yields_one_class_and_one_circular_edge() {
    let diagram = schemas(
        r#"    Node:
      properties:
        next: {$ref: '#/components/schemas/Node'}
"#,
    );

    assert_eq!(diagram.class_count(), 1);
    let circular: Vec<_> = diagram
        .relationships()
        .iter()
        .filter(|r| r.label.as_deref() == Some("circular"))
        .collect();
    assert_eq!(circular.len(), 1);
    assert_eq!(circular[0].kind, RelationshipKind::Dependency);
}

#[test]
fn test_enum_inline_boundary() {
    let diagram = schemas(
        r#"    Shirt:
      properties:
        size:
          type: string
          enum: [xs, s, m, l, xl]
        color:
          type: string
          enum: [red, green, blue, black, white, grey]
"#,
    );

    let shirt = diagram.get_class("Shirt").unwrap();
    let names: Vec<&str> = shirt.properties.iter().map(|p| p.name.as_str()).collect();
    assert!(names.contains(&"size (enum:xs,s,m,l,xl)"));
    assert!(names.contains(&"color (enum:6 values)"));
}

#[test]
fn test_schemas_named_like_document_objects_keep_their_classes() {
    let document: OpenApi = serde_yaml::from_str(
        r#"openapi: 3.0.3
info: {title: t, version: '1'}
security:
  - Document: []
paths:
  /pets:
    get:
      operationId: listPets
      parameters:
        - name: Owner
          in: query
          schema: {type: string}
      responses:
        '200': {description: ok}
components:
  securitySchemes:
    Document:
      type: http
      scheme: bearer
  schemas:
    Info:
      properties:
        license: {type: string}
        owner: {$ref: '#/components/schemas/Owner'}
    Document:
      properties:
        body: {type: string}
    Owner:
      properties:
        name: {type: string}
"#,
    )
    .unwrap();
    let config = Config::default();
    let diagram = DiagramBuilder::new(&document, &config).build();

    let names = |id: &str| -> Vec<String> {
        diagram
            .get_class(id)
            .unwrap_or_else(|| panic!("missing {}", id))
            .properties
            .iter()
            .map(|p| p.name.clone())
            .collect()
    };
    assert_eq!(names("Info"), vec!["license", "owner"]);
    assert_eq!(names("Document"), vec!["body"]);
    assert_eq!(names("Owner"), vec!["name"]);
    assert_eq!(names("InfoObject"), vec!["title", "version"]);
    assert_eq!(names("DocumentObject"), vec!["openapi"]);

    let info = find(&diagram, "DocumentObject", "InfoObject", RelationshipKind::Composition).unwrap();
    assert_eq!(info.label.as_deref(), Some("info"));
    assert!(find(&diagram, "DocumentObject", "Info", RelationshipKind::Composition).is_none());
    let owner = find(&diagram, "Info", "Owner", RelationshipKind::Composition).unwrap();
    assert_eq!(owner.label.as_deref(), Some("owner"));
    let member = find(&diagram, "Components", "Info", RelationshipKind::Aggregation).unwrap();
    assert_eq!(member.label.as_deref(), Some("schema"));

    let parameter = diagram.get_class("Owner_Parameter").unwrap();
    assert!(parameter.has_annotation("parameter"));

    let scheme = diagram.get_class("Document_SecurityScheme").unwrap();
    assert!(scheme.has_annotation("security"));
    assert!(find(&diagram, "DocumentObject", "Document_SecurityScheme", RelationshipKind::Dependency).is_some());
    assert!(find(&diagram, "ListPets", "Document_SecurityScheme", RelationshipKind::Dependency).is_some());
    assert!(find(&diagram, "ListPets", "Document", RelationshipKind::Dependency).is_none());
}

#[test]
fn test_boolean_property_schemas() {
    let diagram = schemas(
        r#"    Envelope:
      type: object
      properties:
        payload: true
        never: false
        tags:
          type: array
          items: true
"#,
    );

    let envelope = diagram.get_class("Envelope").unwrap();
    let names: Vec<&str> = envelope.properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["payload", "never", "tags"]);
    assert_eq!(diagram.class_count(), 1);
}
