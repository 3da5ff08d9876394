//! Property analyzer: constraints, visibility and type strings

use crate::identifier::{ref_tail, sanitize_id};
use crate::model::{PropertyConstraints, Visibility};
use crate::openapi::Schema;

use super::format_value;

/// Validation constraints of a schema, `None` when it declares none
pub fn extract_constraints(schema: &Schema) -> Option<PropertyConstraints> {
    let constraints = PropertyConstraints {
        format: schema.format.clone(),
        pattern: schema.pattern.clone(),
        min_length: schema.min_length,
        max_length: schema.max_length,
        minimum: schema.minimum,
        maximum: schema.maximum,
        min_items: schema.min_items,
        max_items: schema.max_items,
        unique_items: schema.unique_items,
        enum_values: schema.enum_values.iter().map(format_value).collect(),
    };
    (constraints != PropertyConstraints::default()).then_some(constraints)
}

/// Required properties are protected, write-only ones package, the rest public
pub fn determine_visibility(name: &str, schema: &Schema, required: &[String]) -> Visibility {
    if required.iter().any(|r| r == name) {
        Visibility::Protected
    } else if schema.write_only {
        Visibility::Package
    } else {
        Visibility::Public
    }
}

/// First non-`null` entry of the type vector, or `any`
pub fn base_type(schema: &Schema) -> &str {
    schema
        .schema_type
        .iter()
        .map(String::as_str)
        .find(|t| *t != "null")
        .or_else(|| schema.primary_type())
        .unwrap_or("any")
}

/// `[min..max]` when either bound is set (missing bounds are `0` and `*`)
pub fn items_cardinality(schema: &Schema) -> String {
    if schema.min_items.is_none() && schema.max_items.is_none() {
        return String::new();
    }
    let min = schema.min_items.unwrap_or(0).to_string();
    let max = schema
        .max_items
        .map(|m| m.to_string())
        .unwrap_or_else(|| "*".to_string());
    format!("[{}..{}]", min, max)
}

/// Type name of an array's items: the referenced schema, the item type, or `any`
pub fn item_type(schema: &Schema) -> String {
    match schema.items.as_deref() {
        Some(items) => match items.reference_path() {
            Some(reference) => sanitize_id(ref_tail(reference)),
            None => base_type(items).to_string(),
        },
        None => "any".to_string(),
    }
}

/// Plain type string for a property
///
/// Arrays become `<item><cardinality>[]`. Other schemas use their base type
/// and get a trailing `?` when the property is neither required nor nullable.
pub fn generate_type_string(schema: &Schema, name: &str, required: &[String]) -> String {
    if schema.is_array() {
        return format!("{}{}[]", item_type(schema), items_cardinality(schema));
    }
    let mut type_string = base_type(schema).to_string();
    if !required.iter().any(|r| r == name) && !schema.is_nullable() {
        type_string.push('?');
    }
    type_string
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Errors for bounds that contradict each other
pub fn validate_constraints(constraints: &PropertyConstraints) -> Vec<String> {
    let mut errors = Vec::new();
    if let (Some(min), Some(max)) = (constraints.min_length, constraints.max_length) {
        if min > max {
            errors.push(format!("minLength ({}) is greater than maxLength ({})", min, max));
        }
    }
    if let (Some(min), Some(max)) = (constraints.minimum, constraints.maximum) {
        if min > max {
            errors.push(format!(
                "minimum ({}) is greater than maximum ({})",
                format_number(min),
                format_number(max)
            ));
        }
    }
    if let (Some(min), Some(max)) = (constraints.min_items, constraints.max_items) {
        if min > max {
            errors.push(format!("minItems ({}) is greater than maxItems ({})", min, max));
        }
    }
    errors
}

/// Marker text shown after a property: `format:uuid, 1..64, pattern:^a`
///
/// Patterns of 30 characters or more are left out.
pub fn constraint_markers(constraints: &PropertyConstraints) -> Vec<String> {
    let mut markers = Vec::new();
    if let Some(format) = &constraints.format {
        markers.push(format!("format:{}", format));
    }
    if !constraints.enum_values.is_empty() {
        markers.push(format!("enum:{}", constraints.enum_values.join(",")));
    }
    if constraints.min_length.is_some() || constraints.max_length.is_some() {
        markers.push(format!(
            "length:{}..{}",
            constraints.min_length.map(|v| v.to_string()).unwrap_or_else(|| "0".into()),
            constraints.max_length.map(|v| v.to_string()).unwrap_or_else(|| "*".into())
        ));
    }
    if let Some(min) = constraints.minimum {
        markers.push(format!("min:{}", format_number(min)));
    }
    if let Some(max) = constraints.maximum {
        markers.push(format!("max:{}", format_number(max)));
    }
    if constraints.min_items.is_some() || constraints.max_items.is_some() {
        markers.push(format!(
            "items:{}..{}",
            constraints.min_items.map(|v| v.to_string()).unwrap_or_else(|| "0".into()),
            constraints.max_items.map(|v| v.to_string()).unwrap_or_else(|| "*".into())
        ));
    }
    if let Some(pattern) = constraints.pattern.as_ref().filter(|p| p.len() < 30) {
        markers.push(format!("pattern:{}", pattern));
    }
    if constraints.unique_items {
        markers.push("unique".to_string());
    }
    markers
}
