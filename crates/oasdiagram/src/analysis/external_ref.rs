//! External reference handling
//!
//! References into other files are not followed. Each becomes a placeholder
//! class annotated `external`, and edges pointing at it carry the file name.

use crate::model::{Class, Relationship};

/// A parsed `$ref` string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefInfo {
    pub raw: String,
    pub is_local: bool,
    /// File or URL part of an external reference
    pub file: Option<String>,
    /// Part after `#`, without the `#`
    pub fragment: Option<String>,
    /// Last segment of the fragment, or the file stem
    pub schema_name: String,
}

/// Split a reference into file and fragment
///
/// `#/...` is local. `file.yaml#/Pet` and `https://host/x.json#/Pet` are
/// external with a fragment; a string without `#` is a bare file reference.
pub fn parse_ref(reference: &str) -> RefInfo {
    if let Some(fragment) = reference.strip_prefix('#') {
        return RefInfo {
            raw: reference.to_string(),
            is_local: true,
            file: None,
            fragment: Some(fragment.to_string()),
            schema_name: last_segment(fragment).to_string(),
        };
    }

    let (file, fragment) = match reference.split_once('#') {
        Some((file, fragment)) => (file, Some(fragment)),
        None => (reference, None),
    };
    let schema_name = match fragment.map(last_segment).filter(|s| !s.is_empty()) {
        Some(name) => name.to_string(),
        None => file_stem(file).to_string(),
    };
    RefInfo {
        raw: reference.to_string(),
        is_local: false,
        file: Some(file.to_string()),
        fragment: fragment.map(str::to_string),
        schema_name,
    }
}

fn last_segment(pointer: &str) -> &str {
    pointer.rsplit('/').next().unwrap_or(pointer)
}

fn file_stem(file: &str) -> &str {
    let name = last_segment(file);
    name.split('.').next().filter(|s| !s.is_empty()).unwrap_or(name)
}

#[derive(Debug, Clone, Default)]
pub struct ExternalRefHandler {
    simplify_references: bool,
}

impl ExternalRefHandler {
    pub fn new(simplify_references: bool) -> Self {
        Self {
            simplify_references,
        }
    }

    pub fn is_external(reference: &str) -> bool {
        !parse_ref(reference).is_local
    }

    /// Placeholder ID: the full reference, or only the file when references
    /// are simplified. Sanitized when stored.
    pub fn placeholder_id(&self, info: &RefInfo) -> String {
        match (&info.file, self.simplify_references) {
            (Some(file), true) => file.clone(),
            _ => info.raw.clone(),
        }
    }

    pub fn create_placeholder(&self, info: &RefInfo) -> Class {
        let name = if self.simplify_references {
            info.file.clone().unwrap_or_else(|| info.schema_name.clone())
        } else {
            info.schema_name.clone()
        };
        let mut class = Class::new(self.placeholder_id(info), name).with_annotation("external");
        if let Some(file) = &info.file {
            class.metadata.insert("file".to_string(), file.clone());
        }
        if let Some(fragment) = &info.fragment {
            class.metadata.insert("fragment".to_string(), fragment.clone());
        }
        class
    }

    /// Mark an edge as pointing at an external placeholder
    pub fn annotate_edge(&self, relationship: Relationship, info: &RefInfo) -> Relationship {
        let relationship = relationship.with_metadata("external", "true");
        match &info.file {
            Some(file) => relationship.with_metadata("externalFile", file.clone()),
            None => relationship,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RelationshipKind;

    #[test]
    fn test_local_ref() {
        let info = parse_ref("#/components/schemas/Pet");
        assert!(info.is_local);
        assert_eq!(info.schema_name, "Pet");
        assert_eq!(info.file, None);
    }

    #[test]
    fn test_file_with_fragment() {
        let info = parse_ref("common.yaml#/components/schemas/Error");
        assert!(!info.is_local);
        assert_eq!(info.file.as_deref(), Some("common.yaml"));
        assert_eq!(info.fragment.as_deref(), Some("/components/schemas/Error"));
        assert_eq!(info.schema_name, "Error");
    }

    #[test]
    fn test_url_with_fragment() {
        let info = parse_ref("https://example.com/schemas/pet.json#/Pet");
        assert_eq!(info.file.as_deref(), Some("https://example.com/schemas/pet.json"));
        assert_eq!(info.schema_name, "Pet");
    }

    #[test]
    fn test_bare_file() {
        let info = parse_ref("models/user.yaml");
        assert!(!info.is_local);
        assert_eq!(info.fragment, None);
        assert_eq!(info.schema_name, "user");
    }

    #[test]
    fn test_malformed_does_not_panic() {
        for raw in ["", "#", "##", "a#", "/"] {
            let _ = parse_ref(raw);
        }
        assert!(!parse_ref("").is_local);
    }

    #[test]
    fn test_placeholder() {
        let info = parse_ref("common.yaml#/Error");
        let class = ExternalRefHandler::default().create_placeholder(&info);
        assert_eq!(class.id, "common.yaml#/Error");
        assert_eq!(class.name, "Error");
        assert!(class.has_annotation("external"));
        assert_eq!(class.metadata.get("file").map(String::as_str), Some("common.yaml"));
        assert_eq!(class.metadata.get("fragment").map(String::as_str), Some("/Error"));
    }

    #[test]
    fn test_simplified_placeholder_keyed_by_file() {
        let handler = ExternalRefHandler::new(true);
        let a = handler.placeholder_id(&parse_ref("common.yaml#/Error"));
        let b = handler.placeholder_id(&parse_ref("common.yaml#/Problem"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_annotate_edge() {
        let info = parse_ref("common.yaml#/Error");
        let edge = ExternalRefHandler::default().annotate_edge(
            Relationship::new("Pet", "common.yaml#/Error", RelationshipKind::Composition),
            &info,
        );
        assert_eq!(edge.metadata.get("external").map(String::as_str), Some("true"));
        assert_eq!(
            edge.metadata.get("externalFile").map(String::as_str),
            Some("common.yaml")
        );
    }
}
