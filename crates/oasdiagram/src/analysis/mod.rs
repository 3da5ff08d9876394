//! Schema analyzers
//!
//! Each analyzer answers one question about a schema (constraints, enum
//! shape, discriminator mapping, inherited properties, composition pattern,
//! external references) or about the finished diagram (usage, duplicate
//! references). Analyzers never fail: missing or empty input yields an empty
//! result.

mod aggregator;
mod discriminator;
mod enums;
mod external_ref;
mod inheritance;
mod property;
mod relationship;
mod usage;

pub use aggregator::*;
pub use discriminator::*;
pub use enums::*;
pub use external_ref::*;
pub use inheritance::*;
pub use property::*;
pub use relationship::*;
pub use usage::*;

use serde_json::Value;

use crate::identifier::{ref_tail, sanitize_id};
use crate::openapi::Schema;

/// Display form of a JSON value: strings unquoted, everything else as JSON
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// ID of a composition member or `items` schema owned by `parent_id`
///
/// References use the target schema name, titled inline schemas their
/// title, anything else `<parent>_<slot>`.
pub fn member_id(parent_id: &str, slot: &str, schema: &Schema) -> String {
    if let Some(reference) = schema.reference_path() {
        return sanitize_id(ref_tail(reference));
    }
    if let Some(title) = schema.title() {
        return sanitize_id(title);
    }
    sanitize_id(&format!("{}_{}", parent_id, slot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&json!("active")), "active");
        assert_eq!(format_value(&json!(3)), "3");
        assert_eq!(format_value(&json!(null)), "null");
        assert_eq!(format_value(&json!(true)), "true");
    }

    #[test]
    fn test_member_id() {
        assert_eq!(member_id("Pet", "allOf_0", &Schema::reference("#/components/schemas/Base")), "Base");
        assert_eq!(member_id("Pet", "allOf_1", &Schema::typed("object").with_title("Extra")), "Extra");
        assert_eq!(member_id("Pet", "oneOf_2", &Schema::typed("object")), "Pet_oneOf_2");
    }
}
