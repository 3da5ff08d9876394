//! Resolution of local `$ref` pointers
//!
//! Only same-document references (`#/...`) are resolved; anything else is an
//! external reference and is represented by a placeholder class instead.

use super::document::{
    Callback, Components, Example, Header, Link, OpenApi, Parameter, RefOr, RequestBody,
    Response, SecurityScheme,
};
use super::path::{decode_pointer_segment, JsonPath, PathSegment};
use super::schema::Schema;

/// Maximum `$ref` hops followed when a component is itself a reference
const MAX_REF_HOPS: usize = 16;

/// Resolves references to schema objects
///
/// The builder and the analyzers only ever need this seam, which keeps them
/// testable against hand-built documents.
pub trait SchemaResolver: Send + Sync {
    /// Resolve a `$ref` string to the referenced schema
    fn resolve_schema(&self, reference: &str) -> Option<&Schema>;

    /// Follow `schema` through any chain of references to a concrete schema
    fn resolve_chain<'a>(&'a self, schema: &'a Schema) -> Option<&'a Schema> {
        let mut current = schema;
        for _ in 0..MAX_REF_HOPS {
            match current.reference_path() {
                Some(reference) => current = self.resolve_schema(reference)?,
                None => return Some(current),
            }
        }
        None
    }
}

/// Walk `segments` below a schema (`properties/x`, `allOf/0`, `items`, ...)
fn walk_schema<'a>(mut schema: &'a Schema, segments: &[PathSegment]) -> Option<&'a Schema> {
    let mut iter = segments.iter();
    while let Some(segment) = iter.next() {
        let PathSegment::Key(key) = segment else {
            return None;
        };
        schema = match key.as_str() {
            "properties" => match iter.next()? {
                PathSegment::Key(name) => schema.properties.get(name)?,
                PathSegment::Index(i) => schema.properties.get(&i.to_string())?,
            },
            "allOf" | "oneOf" | "anyOf" => {
                let PathSegment::Index(index) = iter.next()? else {
                    return None;
                };
                let list = match key.as_str() {
                    "allOf" => &schema.all_of,
                    "oneOf" => &schema.one_of,
                    _ => &schema.any_of,
                };
                list.get(*index)?
            }
            "items" => schema.items.as_deref()?,
            "not" => schema.not.as_deref()?,
            "additionalProperties" => schema.additional_properties.as_ref()?.as_schema()?,
            _ => return None,
        };
    }
    Some(schema)
}

/// Component section and name addressed by a local reference
pub fn component_target(reference: &str) -> Option<(String, String)> {
    let pointer = reference.strip_prefix("#/components/")?;
    let mut parts = pointer.splitn(3, '/');
    let section = parts.next()?.to_string();
    let name = decode_pointer_segment(parts.next()?);
    if name.is_empty() {
        return None;
    }
    Some((section, name))
}

fn lookup<'a, T>(
    map: &'a indexmap::IndexMap<String, RefOr<T>>,
    reference: &str,
    section: &str,
) -> Option<&'a T> {
    let mut reference = reference.to_string();
    for _ in 0..MAX_REF_HOPS {
        let (found_section, name) = component_target(&reference)?;
        if found_section != section {
            return None;
        }
        match map.get(&name)? {
            RefOr::Item(item) => return Some(item),
            RefOr::Ref { reference: next } => reference = next.clone(),
        }
    }
    None
}

impl OpenApi {
    fn components_ref(&self) -> Option<&Components> {
        self.components.as_ref()
    }

    pub fn resolve_parameter(&self, reference: &str) -> Option<&Parameter> {
        lookup(&self.components_ref()?.parameters, reference, "parameters")
    }

    pub fn resolve_response(&self, reference: &str) -> Option<&Response> {
        lookup(&self.components_ref()?.responses, reference, "responses")
    }

    pub fn resolve_request_body(&self, reference: &str) -> Option<&RequestBody> {
        lookup(&self.components_ref()?.request_bodies, reference, "requestBodies")
    }

    pub fn resolve_header(&self, reference: &str) -> Option<&Header> {
        lookup(&self.components_ref()?.headers, reference, "headers")
    }

    pub fn resolve_example(&self, reference: &str) -> Option<&Example> {
        lookup(&self.components_ref()?.examples, reference, "examples")
    }

    pub fn resolve_link(&self, reference: &str) -> Option<&Link> {
        lookup(&self.components_ref()?.links, reference, "links")
    }

    pub fn resolve_callback(&self, reference: &str) -> Option<&Callback> {
        lookup(&self.components_ref()?.callbacks, reference, "callbacks")
    }

    pub fn resolve_security_scheme(&self, reference: &str) -> Option<&SecurityScheme> {
        lookup(
            &self.components_ref()?.security_schemes,
            reference,
            "securitySchemes",
        )
    }
}

impl SchemaResolver for OpenApi {
    fn resolve_schema(&self, reference: &str) -> Option<&Schema> {
        let path = JsonPath::from_pointer(reference)?;
        let segments = path.segments();
        match segments {
            [PathSegment::Key(c), PathSegment::Key(s), PathSegment::Key(name), rest @ ..]
                if c == "components" && s == "schemas" =>
            {
                let schema = self.components_ref()?.schemas.get(name)?;
                walk_schema(schema, rest)
            }
            _ => None,
        }
    }
}
