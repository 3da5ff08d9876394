//! JSON paths addressing nodes inside an OpenAPI document
//!
//! Every node the builder visits is identified by the path from the document
//! root. Paths double as the key of the visited set used for cycle detection.

use std::fmt;

/// A single step in a [`JsonPath`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object member (`.name` or `['name']`)
    Key(String),
    /// Array element (`[3]`)
    Index(usize),
}

/// Path from the document root to a node, rendered as
/// `$.paths['/pets'].get.responses['200']`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JsonPath {
    segments: Vec<PathSegment>,
}

impl JsonPath {
    /// The document root (`$`)
    pub fn root() -> Self {
        Self::default()
    }

    /// Path of a component schema (`$.components.schemas['Name']`)
    pub fn component_schema(name: &str) -> Self {
        Self::root().key("components").key("schemas").key(name)
    }

    /// Extend the path with an object member
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.segments.push(PathSegment::Key(key.into()));
        next
    }

    /// Extend the path with an array index
    pub fn index(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.segments.push(PathSegment::Index(index));
        next
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The last object key in the path, if any
    pub fn last_key(&self) -> Option<&str> {
        self.segments.iter().rev().find_map(|segment| match segment {
            PathSegment::Key(key) => Some(key.as_str()),
            PathSegment::Index(_) => None,
        })
    }

    /// Build a path from a local JSON pointer such as `#/components/schemas/Pet`.
    ///
    /// Returns `None` for references that do not start with `#`.
    pub fn from_pointer(pointer: &str) -> Option<Self> {
        let rest = pointer.strip_prefix('#')?;
        let mut path = Self::root();
        for raw in rest.split('/').filter(|s| !s.is_empty()) {
            let segment = decode_pointer_segment(raw);
            path = match segment.parse::<usize>() {
                Ok(index) if path.expects_index() => path.index(index),
                _ => path.key(segment),
            };
        }
        Some(path)
    }

    /// Array-valued members are addressed by index, everything else by key.
    fn expects_index(&self) -> bool {
        matches!(
            self.segments.last(),
            Some(PathSegment::Key(k))
                if matches!(k.as_str(), "allOf" | "oneOf" | "anyOf" | "parameters" | "servers" | "tags")
        )
    }
}

/// Decode a JSON pointer segment (`~1` is `/`, `~0` is `~`).
pub fn decode_pointer_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

fn is_plain_identifier(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        && !key.starts_with(|c: char| c.is_ascii_digit())
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for segment in &self.segments {
            match segment {
                PathSegment::Key(key) if is_plain_identifier(key) => write!(f, ".{}", key)?,
                PathSegment::Key(key) => write!(f, "['{}']", key.replace('\'', "\\'"))?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_display() {
        assert_eq!(JsonPath::root().to_string(), "$");
    }

    #[test]
    fn test_component_schema_display() {
        let path = JsonPath::component_schema("Pet").key("properties").key("id");
        assert_eq!(path.to_string(), "$.components.schemas.Pet.properties.id");
    }

    #[test]
    fn test_quoted_keys() {
        let path = JsonPath::root().key("paths").key("/pets/{id}").key("get");
        assert_eq!(path.to_string(), "$.paths['/pets/{id}'].get");
    }

    #[test]
    fn test_index_segments() {
        let path = JsonPath::component_schema("Pet").key("allOf").index(1);
        assert_eq!(path.to_string(), "$.components.schemas.Pet.allOf[1]");
        assert_eq!(path.last_key(), Some("allOf"));
    }

    #[test]
    fn test_from_pointer() {
        let path = JsonPath::from_pointer("#/components/schemas/Pet/allOf/0").unwrap();
        assert_eq!(path, JsonPath::component_schema("Pet").key("allOf").index(0));
    }

    #[test]
    fn test_from_pointer_escapes() {
        let path = JsonPath::from_pointer("#/paths/~1pets~1{id}").unwrap();
        assert_eq!(path, JsonPath::root().key("paths").key("/pets/{id}"));
    }

    #[test]
    fn test_from_pointer_rejects_external() {
        assert!(JsonPath::from_pointer("other.yaml#/Pet").is_none());
    }

    #[test]
    fn test_numeric_property_name_stays_key() {
        let path = JsonPath::from_pointer("#/components/schemas/Pet/properties/200").unwrap();
        assert_eq!(path.segments().last(), Some(&PathSegment::Key("200".to_string())));
    }
}
