//! OpenAPI Schema Object
//!
//! One struct covers both inline schemas and references: a schema whose
//! `$ref` is set behaves as a proxy for the referenced component.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Scalar JSON types, used to decide whether a union variant is worth a class
pub const SCALAR_TYPES: &[&str] = &["string", "number", "integer", "boolean", "null"];

/// Discriminator Object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Discriminator {
    #[serde(rename = "propertyName")]
    pub property_name: String,
    /// Discriminator value → `$ref` (or schema name)
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub mapping: IndexMap<String, String>,
}

/// `additionalProperties` is either a flag or a schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<Schema>),
}

impl AdditionalProperties {
    pub fn as_schema(&self) -> Option<&Schema> {
        match self {
            AdditionalProperties::Schema(schema) => Some(schema),
            AdditionalProperties::Allowed(_) => None,
        }
    }
}

/// JSON Schema / OpenAPI schema definition
///
/// 3.1 documents may write a schema as a bare boolean: `true` accepts
/// anything and reads as an empty schema, `false` reads as `not: {}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", rename_all = "camelCase")]
pub struct Schema {
    #[serde(default, rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// `type`, normalised to a vector (3.1 allows `["string", "null"]`)
    #[serde(
        default,
        rename = "type",
        deserialize_with = "deserialize_types",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub schema_type: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Schema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Schema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<Schema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,
    #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    #[serde(default, rename = "const", skip_serializing_if = "Option::is_none")]
    pub const_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unique_items: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Discriminator>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub write_only: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolOrSchema {
    Bool(bool),
    Schema(#[serde(with = "Schema")] Schema),
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match BoolOrSchema::deserialize(deserializer)? {
            BoolOrSchema::Bool(true) => Schema::default(),
            BoolOrSchema::Bool(false) => Schema {
                not: Some(Box::default()),
                ..Schema::default()
            },
            BoolOrSchema::Schema(schema) => schema,
        })
    }
}

impl Serialize for Schema {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Schema::serialize(self, serializer)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TypeField {
    Single(String),
    Many(Vec<String>),
}

fn deserialize_types<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<TypeField>::deserialize(deserializer)? {
        Some(TypeField::Single(t)) => vec![t],
        Some(TypeField::Many(types)) => types,
        None => Vec::new(),
    })
}

impl Schema {
    /// A `$ref` proxy pointing at `reference`
    pub fn reference(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            ..Self::default()
        }
    }

    /// An inline schema with a single type
    pub fn typed(schema_type: impl Into<String>) -> Self {
        Self {
            schema_type: vec![schema_type.into()],
            ..Self::default()
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_required(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }

    pub fn is_ref(&self) -> bool {
        self.reference.is_some()
    }

    pub fn reference_path(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    /// First entry of the type vector
    pub fn primary_type(&self) -> Option<&str> {
        self.schema_type.first().map(String::as_str)
    }

    pub fn is_array(&self) -> bool {
        self.primary_type() == Some("array") || (self.schema_type.is_empty() && self.items.is_some())
    }

    /// `nullable: true` (3.0) or a `null` member of the type vector (3.1)
    pub fn is_nullable(&self) -> bool {
        self.nullable || self.schema_type.iter().any(|t| t == "null")
    }

    /// Non-empty title, if any
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.trim().is_empty())
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    pub fn has_composition(&self) -> bool {
        !self.all_of.is_empty() || !self.one_of.is_empty() || !self.any_of.is_empty()
    }

    pub fn is_enum(&self) -> bool {
        !self.enum_values.is_empty()
    }

    /// Not a ref, no title, no properties, and a scalar first type
    pub fn is_simple_scalar(&self) -> bool {
        !self.is_ref()
            && self.title().is_none()
            && self.properties.is_empty()
            && self
                .primary_type()
                .is_some_and(|t| SCALAR_TYPES.contains(&t))
    }

    /// Union variants: `oneOf` first, then `anyOf`, with the keyword used
    pub fn union_variants(&self) -> Option<(&'static str, &[Schema])> {
        if !self.one_of.is_empty() {
            Some(("oneOf", &self.one_of))
        } else if !self.any_of.is_empty() {
            Some(("anyOf", &self.any_of))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Schema {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_type_string_or_array() {
        assert_eq!(parse("type: string").schema_type, vec!["string"]);
        assert_eq!(
            parse("type: [string, 'null']").schema_type,
            vec!["string", "null"]
        );
        assert!(parse("title: Empty").schema_type.is_empty());
    }

    #[test]
    fn test_nullable_forms() {
        assert!(parse("type: string\nnullable: true").is_nullable());
        assert!(parse("type: [integer, 'null']").is_nullable());
        assert!(!parse("type: integer").is_nullable());
    }

    #[test]
    fn test_reference_predicate() {
        let schema = parse("$ref: '#/components/schemas/Pet'");
        assert!(schema.is_ref());
        assert_eq!(schema.reference_path(), Some("#/components/schemas/Pet"));
    }

    #[test]
    fn test_properties_preserve_order() {
        let schema = parse(
            "type: object\nproperties:\n  zeta: {type: string}\n  alpha: {type: string}\n  mid: {type: string}",
        );
        let names: Vec<_> = schema.properties.keys().cloned().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_additional_properties_forms() {
        let flag = parse("additionalProperties: false");
        assert_eq!(flag.additional_properties, Some(AdditionalProperties::Allowed(false)));
        let schema = parse("additionalProperties:\n  $ref: '#/components/schemas/Tag'");
        assert!(schema
            .additional_properties
            .as_ref()
            .and_then(AdditionalProperties::as_schema)
            .is_some_and(Schema::is_ref));
    }

    #[test]
    fn test_boolean_schemas() {
        let schema = parse("type: object\nproperties:\n  anything: true\n  nothing: false\nitems: false");
        assert_eq!(schema.properties["anything"], Schema::default());
        assert!(schema.properties["nothing"].not.is_some());
        assert!(schema.items.as_deref().is_some_and(|items| items.not.is_some()));

        let flag = parse("additionalProperties: true");
        assert_eq!(flag.additional_properties, Some(AdditionalProperties::Allowed(true)));
    }

    #[test]
    fn test_simple_scalar() {
        assert!(Schema::typed("string").is_simple_scalar());
        assert!(!Schema::typed("object").is_simple_scalar());
        assert!(!Schema::typed("string").with_title("Code").is_simple_scalar());
        assert!(!Schema::reference("#/components/schemas/A").is_simple_scalar());
    }

    #[test]
    fn test_union_variants_prefers_one_of() {
        let schema = parse("oneOf: [{type: string}]\nanyOf: [{type: integer}, {type: boolean}]");
        let (keyword, variants) = schema.union_variants().unwrap();
        assert_eq!(keyword, "oneOf");
        assert_eq!(variants.len(), 1);
    }

    #[test]
    fn test_blank_title_ignored() {
        assert!(Schema::default().with_title("  ").title().is_none());
    }
}
