//! Enum analyzer
//!
//! Decides whether an enum is listed inline in the property name, collapsed
//! to a value count, or drawn as its own `<<enumeration>>` class.

use crate::core::EnumVisualization;
use crate::identifier::sanitize_id;
use crate::model::{Class, ClassKind, Property};
use crate::openapi::Schema;

use super::format_value;

/// Inline lists longer than this collapse to a value count
const MAX_INLINE_TEXT: usize = 100;

/// What an enum schema declares
#[derive(Debug, Clone, PartialEq)]
pub struct EnumInfo {
    pub name: String,
    pub enum_type: String,
    pub values: Vec<String>,
    pub nullable: bool,
    pub default: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EnumAnalyzer {
    visualization: EnumVisualization,
    max_inline_values: usize,
}

impl Default for EnumAnalyzer {
    fn default() -> Self {
        Self::new(EnumVisualization::Inline, 5)
    }
}

impl EnumAnalyzer {
    pub fn new(visualization: EnumVisualization, max_inline_values: usize) -> Self {
        Self {
            visualization,
            max_inline_values,
        }
    }

    pub fn visualization(&self) -> EnumVisualization {
        self.visualization
    }

    /// `None` unless the schema has a non-empty `enum`
    pub fn analyze_enum(&self, schema: &Schema, property_name: &str) -> Option<EnumInfo> {
        if schema.enum_values.is_empty() {
            return None;
        }
        Some(EnumInfo {
            name: property_name.to_string(),
            enum_type: schema.primary_type().unwrap_or("string").to_string(),
            values: schema.enum_values.iter().map(format_value).collect(),
            nullable: schema.is_nullable(),
            default: schema.default.as_ref().map(format_value),
        })
    }

    /// Only the `class` mode draws enums as separate classes
    pub fn should_render_as_class(&self) -> bool {
        matches!(self.visualization, EnumVisualization::Class)
    }

    /// `A,B,C`, or `<N> values` when there are too many or the text is too long
    pub fn format_enum_for_inline(&self, info: &EnumInfo) -> String {
        let count = info.values.len();
        if count > self.max_inline_values {
            return format!("{} values", count);
        }
        let joined = info.values.join(",");
        if joined.len() > MAX_INLINE_TEXT {
            format!("{} values", count)
        } else {
            joined
        }
    }

    /// Suffix appended to a property name, following the visualization mode
    pub fn property_annotation(&self, info: &EnumInfo) -> String {
        match self.visualization {
            EnumVisualization::Comment => format!("(enum:{} values)", info.values.len()),
            _ => format!("(enum:{})", self.format_enum_for_inline(info)),
        }
    }

    /// An `<<enumeration>>` class with one member per value
    pub fn create_enum_class(&self, info: &EnumInfo, schema_name: &str) -> Class {
        let mut class = Class::new(sanitize_id(schema_name), schema_name)
            .with_kind(ClassKind::Enum)
            .with_annotation("enumeration")
            .with_metadata("enumType", info.enum_type.clone())
            .with_metadata("nullable", info.nullable.to_string());
        if let Some(default) = &info.default {
            class.metadata.insert("default".to_string(), default.clone());
        }
        for value in &info.values {
            class.add_property(Property::new(value.clone(), ""));
        }
        class
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enum_schema(values: &[&str]) -> Schema {
        Schema {
            enum_values: values.iter().map(|v| serde_json::json!(v)).collect(),
            ..Schema::default()
        }
    }

    #[test]
    fn test_not_an_enum() {
        assert!(EnumAnalyzer::default()
            .analyze_enum(&Schema::typed("string"), "status")
            .is_none());
    }

    #[test]
    fn test_type_defaults_to_string() {
        let info = EnumAnalyzer::default()
            .analyze_enum(&enum_schema(&["a"]), "status")
            .unwrap();
        assert_eq!(info.enum_type, "string");
        assert!(!info.nullable);
    }

    #[test]
    fn test_inline_at_cap() {
        let analyzer = EnumAnalyzer::default();
        let info = analyzer
            .analyze_enum(&enum_schema(&["a", "b", "c", "d", "e"]), "x")
            .unwrap();
        assert_eq!(analyzer.format_enum_for_inline(&info), "a,b,c,d,e");
    }

    #[test]
    fn test_count_above_cap() {
        let analyzer = EnumAnalyzer::default();
        let info = analyzer
            .analyze_enum(&enum_schema(&["a", "b", "c", "d", "e", "f"]), "x")
            .unwrap();
        assert_eq!(analyzer.format_enum_for_inline(&info), "6 values");
    }

    #[test]
    fn test_long_text_degrades_to_count() {
        let analyzer = EnumAnalyzer::default();
        let long = "v".repeat(60);
        let info = analyzer
            .analyze_enum(&enum_schema(&[&long, &long]), "x")
            .unwrap();
        assert_eq!(analyzer.format_enum_for_inline(&info), "2 values");
    }

    #[test]
    fn test_render_as_class_modes() {
        assert!(!EnumAnalyzer::new(EnumVisualization::Inline, 5).should_render_as_class());
        assert!(!EnumAnalyzer::new(EnumVisualization::Comment, 5).should_render_as_class());
        assert!(EnumAnalyzer::new(EnumVisualization::Class, 5).should_render_as_class());
    }

    #[test]
    fn test_property_annotation() {
        let info = EnumAnalyzer::default()
            .analyze_enum(&enum_schema(&["A", "B"]), "x")
            .unwrap();
        assert_eq!(EnumAnalyzer::default().property_annotation(&info), "(enum:A,B)");
        assert_eq!(
            EnumAnalyzer::new(EnumVisualization::Comment, 5).property_annotation(&info),
            "(enum:2 values)"
        );
    }

    #[test]
    fn test_create_enum_class() {
        let mut schema = enum_schema(&["available", "sold"]);
        schema.default = Some(serde_json::json!("available"));
        let analyzer = EnumAnalyzer::default();
        let info = analyzer.analyze_enum(&schema, "status").unwrap();
        let class = analyzer.create_enum_class(&info, "PetStatus");

        assert_eq!(class.id, "PetStatus");
        assert_eq!(class.kind, ClassKind::Enum);
        assert!(class.has_annotation("enumeration"));
        assert_eq!(class.properties.len(), 2);
        assert_eq!(class.properties[0].property_type, "");
        assert_eq!(class.metadata.get("default").map(String::as_str), Some("available"));
        assert_eq!(class.metadata.get("enumType").map(String::as_str), Some("string"));
    }
}
