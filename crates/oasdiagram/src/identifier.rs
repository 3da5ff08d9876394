//! Stable identifiers for diagram classes
//!
//! IDs are derived from the document object and where it sits in the
//! document, never from traversal order, so the same input always yields the
//! same IDs. Every ID passes through [`sanitize_id`] before it is stored.

use crate::openapi::{JsonPath, Parameter, PathSegment, Schema};

/// Role of a schema that is the top-level payload of a media type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    Response,
    Request,
}

/// Where an object sits: its JSON path plus the parent context needed for IDs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Location {
    pub path: JsonPath,
    /// Map key under which the object is stored (header name, status code, ...)
    pub key: Option<String>,
    /// ID of the owning class
    pub parent_id: Option<String>,
    /// Operation name of the enclosing operation
    pub operation: Option<String>,
    /// Status code of the enclosing response
    pub status: Option<String>,
    /// Set when the object is a response or request payload schema
    pub payload: Option<Payload>,
}

impl Location {
    pub fn root() -> Self {
        Self::default()
    }

    /// Child location one key below, owned by `parent_id`
    pub fn child(&self, key: impl Into<String>, parent_id: &str) -> Self {
        let key = key.into();
        Self {
            path: self.path.key(key.clone()),
            key: Some(key),
            parent_id: Some(parent_id.to_string()),
            operation: self.operation.clone(),
            status: self.status.clone(),
            payload: None,
        }
    }

    /// Child location at an array index, owned by `parent_id`
    pub fn indexed(&self, index: usize, parent_id: &str) -> Self {
        Self {
            path: self.path.index(index),
            key: None,
            parent_id: Some(parent_id.to_string()),
            operation: self.operation.clone(),
            status: self.status.clone(),
            payload: None,
        }
    }

    /// Location of a component schema
    pub fn component_schema(name: &str) -> Self {
        Self {
            path: JsonPath::component_schema(name),
            key: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Document objects that receive identifiers
#[derive(Debug, Clone, Copy)]
pub enum DocumentObject<'a> {
    Document,
    Info,
    Server(usize),
    Tag(&'a str),
    Paths,
    PathItem(&'a str),
    Operation,
    Components,
    Responses,
    Parameter(&'a Parameter),
    Header,
    Example,
    Link,
    Callback,
    Response,
    RequestBody,
    MediaType,
    SecurityScheme,
    Schema(&'a Schema),
    /// Anything else, by type name
    Unknown(&'static str),
}

/// Sanitize an identifier to `[A-Za-z][A-Za-z0-9_]*`
///
/// Characters outside `[A-Za-z0-9_]` become `_`; a leading non-letter gets a
/// `C_` prefix. Applying it twice gives the same result as applying it once.
pub fn sanitize_id(raw: &str) -> String {
    let body: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if body.starts_with(|c: char| c.is_ascii_alphabetic()) {
        body
    } else {
        format!("C_{}", body)
    }
}

/// PascalCase: split on `-`, `_` and whitespace, upper-case the first
/// character of each token, keep the rest as is
pub fn to_pascal_case(input: &str) -> String {
    input
        .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            let mut chars = token.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Operation name: PascalCase `operationId`, else method plus path segments
///
/// `GET /pets/{petId}` without an `operationId` becomes `GetPetsPetId`.
pub fn operation_name(method: &str, path: &str, operation_id: Option<&str>) -> String {
    if let Some(id) = operation_id.filter(|id| !id.trim().is_empty()) {
        return to_pascal_case(id);
    }
    let mut name = to_pascal_case(method);
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let segment: String = segment.chars().filter(|c| *c != '{' && *c != '}').collect();
        name.push_str(&to_pascal_case(&segment));
    }
    name
}

/// Name shown for a PathItem class: `/pets/{id}` becomes `PetsIdPath`
pub fn path_item_name(path: &str) -> String {
    let base = operation_name("", path, None);
    if base.is_empty() {
        "RootPath".to_string()
    } else {
        format!("{}Path", base)
    }
}

/// Last path component of a Rust type name
pub fn type_name_tail(type_name: &'static str) -> &'static str {
    let without_generics = type_name.split('<').next().unwrap_or(type_name);
    without_generics.rsplit("::").next().unwrap_or(without_generics)
}

/// Suffix contributed by the last step of a schema path
fn step_suffix(segments: &[PathSegment]) -> Option<String> {
    match segments {
        [.., PathSegment::Key(container), PathSegment::Key(name)] if container == "properties" => {
            Some(name.clone())
        }
        [.., PathSegment::Key(keyword), PathSegment::Index(index)]
            if matches!(keyword.as_str(), "allOf" | "oneOf" | "anyOf") =>
        {
            Some(format!("{}_{}", keyword, index))
        }
        [.., PathSegment::Key(last)]
            if matches!(last.as_str(), "items" | "additionalProperties" | "not") =>
        {
            Some(last.clone())
        }
        _ => None,
    }
}

/// Component schema name when `path` is exactly `components.schemas.<Name>`
pub fn component_schema_name(path: &JsonPath) -> Option<&str> {
    match path.segments() {
        [PathSegment::Key(c), PathSegment::Key(s), PathSegment::Key(name)]
            if c == "components" && s == "schemas" =>
        {
            Some(name.as_str())
        }
        _ => None,
    }
}

/// ID derived from the JSON path alone
///
/// `components.schemas.Pet.properties.owner.oneOf[1]` becomes
/// `Pet_owner_oneOf_1`. Paths outside component schemas start from the last
/// `schema` member and use `fallback` as the base.
pub fn derive_from_path(path: &JsonPath, fallback: &str) -> String {
    let segments = path.segments();
    let mut base = fallback.to_string();
    let mut start = 0;

    for i in 0..segments.len() {
        match &segments[i..] {
            [PathSegment::Key(c), PathSegment::Key(s), PathSegment::Key(name), ..]
                if c == "components" && s == "schemas" =>
            {
                base = name.clone();
                start = i + 3;
            }
            [PathSegment::Key(k), ..]
                if k == "schema"
                    && i >= start
                    && !matches!(segments.get(i.wrapping_sub(1)), Some(PathSegment::Key(p)) if p == "properties") =>
            {
                base = fallback.to_string();
                start = i + 1;
            }
            _ => {}
        }
    }

    let mut id = base;
    let mut rest = &segments[start.min(segments.len())..];
    while !rest.is_empty() {
        let consumed = match rest {
            [PathSegment::Key(container), PathSegment::Key(name), ..] if container == "properties" => {
                id.push('_');
                id.push_str(name);
                2
            }
            [PathSegment::Key(keyword), PathSegment::Index(index), ..]
                if matches!(keyword.as_str(), "allOf" | "oneOf" | "anyOf") =>
            {
                id.push_str(&format!("_{}_{}", keyword, index));
                2
            }
            [PathSegment::Key(key), ..] => {
                id.push('_');
                id.push_str(key);
                1
            }
            [PathSegment::Index(index), ..] => {
                id.push_str(&format!("_{}", index));
                1
            }
            [] => 0,
        };
        rest = &rest[consumed..];
    }
    sanitize_id(&id)
}

/// Generates class IDs and display names
#[derive(Debug, Clone, Default)]
pub struct Identifier {
    simplify_names: bool,
}

impl Identifier {
    pub fn new(simplify_names: bool) -> Self {
        Self { simplify_names }
    }

    /// Class ID for `object` at `location`, already sanitized
    pub fn id_for(&self, object: DocumentObject<'_>, location: &Location) -> String {
        let raw = match object {
            DocumentObject::Document => "Document".to_string(),
            DocumentObject::Info => "Info".to_string(),
            DocumentObject::Server(index) => format!("Server_{}", index),
            DocumentObject::Tag(name) => format!("Tag_{}", name),
            DocumentObject::Paths => "Paths".to_string(),
            DocumentObject::PathItem(path) => path_item_name(path),
            DocumentObject::Operation => location
                .operation
                .clone()
                .unwrap_or_else(|| self.keyed_or(location, "Operation")),
            DocumentObject::Components => "Components".to_string(),
            DocumentObject::Responses => match &location.operation {
                Some(op) => format!("{}_Responses", op),
                None => "Responses".to_string(),
            },
            DocumentObject::Parameter(parameter) if !parameter.name.is_empty() => {
                parameter.name.clone()
            }
            DocumentObject::Parameter(_) => self.keyed_or(location, "Parameter"),
            DocumentObject::Header => self.keyed_or(location, "Header"),
            DocumentObject::Example | DocumentObject::Link | DocumentObject::Callback => {
                let key = self.keyed_or(location, object.kind());
                match &location.parent_id {
                    Some(parent) => format!("{}_{}", parent, key),
                    None => key,
                }
            }
            DocumentObject::Response => {
                let status = location
                    .status
                    .clone()
                    .unwrap_or_else(|| self.keyed_or(location, "Response"));
                match &location.operation {
                    Some(op) => format!("{}_{}", op, status),
                    None => status,
                }
            }
            DocumentObject::RequestBody => match &location.operation {
                Some(op) => format!("{}_RequestBody", op),
                None => self.keyed_or(location, "RequestBody"),
            },
            DocumentObject::MediaType => {
                let key: String = self
                    .keyed_or(location, "MediaType")
                    .chars()
                    .map(|c| if matches!(c, '/' | '+' | '-') { '_' } else { c })
                    .collect();
                match &location.parent_id {
                    Some(parent) => format!("{}_{}", parent, key),
                    None => key,
                }
            }
            DocumentObject::SecurityScheme => self.keyed_or(location, "SecurityScheme"),
            DocumentObject::Schema(schema) => return self.schema_id(schema, location),
            DocumentObject::Unknown(type_name) => type_name_tail(type_name).to_string(),
        };
        sanitize_id(&raw)
    }

    fn keyed_or(&self, location: &Location, fallback: &str) -> String {
        location
            .key
            .clone()
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Schema ID: payload name, then title, then component key, then path
    pub fn schema_id(&self, schema: &Schema, location: &Location) -> String {
        if let Some(payload) = location.payload {
            let context = location
                .operation
                .clone()
                .or_else(|| location.parent_id.clone())
                .unwrap_or_default();
            let raw = match payload {
                Payload::Response => format!(
                    "{}{}Response",
                    context,
                    location.status.as_deref().unwrap_or_default()
                ),
                Payload::Request => format!("{}Request", context),
            };
            return sanitize_id(&raw);
        }
        if let Some(title) = schema.title() {
            return sanitize_id(title);
        }
        if let Some(name) = component_schema_name(&location.path) {
            return sanitize_id(name);
        }
        match (&location.parent_id, step_suffix(location.path.segments())) {
            (Some(parent), Some(suffix)) => sanitize_id(&format!("{}_{}", parent, suffix)),
            (parent, _) => derive_from_path(&location.path, parent.as_deref().unwrap_or("Schema")),
        }
    }

    /// ID of the component schema a local `$ref` points at
    pub fn ref_id(&self, reference: &str) -> String {
        sanitize_id(ref_tail(reference))
    }

    /// Human label: the segment after the last `.` when names are simplified
    pub fn display_name(&self, label: &str) -> String {
        if self.simplify_names {
            label.rsplit('.').next().unwrap_or(label).to_string()
        } else {
            label.to_string()
        }
    }
}

/// Text after the last `/` of a reference
pub fn ref_tail(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

impl DocumentObject<'_> {
    /// Kind name, used as the fallback key and to qualify clashing IDs
    pub fn kind(&self) -> &'static str {
        match self {
            DocumentObject::Document => "Document",
            DocumentObject::Info => "Info",
            DocumentObject::Server(_) => "Server",
            DocumentObject::Tag(_) => "Tag",
            DocumentObject::Paths => "Paths",
            DocumentObject::PathItem(_) => "PathItem",
            DocumentObject::Operation => "Operation",
            DocumentObject::Components => "Components",
            DocumentObject::Responses => "Responses",
            DocumentObject::Parameter(_) => "Parameter",
            DocumentObject::Header => "Header",
            DocumentObject::Example => "Example",
            DocumentObject::Link => "Link",
            DocumentObject::Callback => "Callback",
            DocumentObject::Response => "Response",
            DocumentObject::RequestBody => "RequestBody",
            DocumentObject::MediaType => "MediaType",
            DocumentObject::SecurityScheme => "SecurityScheme",
            DocumentObject::Schema(_) => "Schema",
            DocumentObject::Unknown(_) => "Object",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_id() {
        assert_eq!(sanitize_id("Pet"), "Pet");
        assert_eq!(sanitize_id("/pets/{id}"), "C__pets__id_");
        assert_eq!(sanitize_id("200"), "C_200");
        assert_eq!(sanitize_id("a-b.c$d#e[f]'g\"h+i j"), "a_b_c_d_e_f__g_h_i_j");
        assert_eq!(sanitize_id(""), "C_");
        assert_eq!(sanitize_id("_private"), "C__private");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        for raw in ["", "200", "_x", "a b", "#/components/schemas/Pet", "Ünïcode"] {
            let once = sanitize_id(raw);
            assert_eq!(sanitize_id(&once), once);
        }
    }

    #[test]
    fn test_pascal_case() {
        assert_eq!(to_pascal_case("list_pets"), "ListPets");
        assert_eq!(to_pascal_case("get-pet by id"), "GetPetById");
        assert_eq!(to_pascal_case("createPet"), "CreatePet");
        assert_eq!(to_pascal_case("__"), "");
    }

    #[test]
    fn test_operation_name() {
        assert_eq!(operation_name("get", "/pets", Some("listPets")), "ListPets");
        assert_eq!(operation_name("get", "/pets/{petId}", None), "GetPetsPetId");
        assert_eq!(operation_name("delete", "/", Some("  ")), "Delete");
    }

    #[test]
    fn test_path_item_name() {
        assert_eq!(path_item_name("/pets/{id}"), "PetsIdPath");
        assert_eq!(path_item_name("/"), "RootPath");
    }

    #[test]
    fn test_parameter_uses_name() {
        let parameter = Parameter {
            name: "page".into(),
            ..Parameter::default()
        };
        let id = Identifier::default().id_for(DocumentObject::Parameter(&parameter), &Location::root());
        assert_eq!(id, "page");
    }

    #[test]
    fn test_response_and_request_ids() {
        let identifier = Identifier::default();
        let loc = Location::root().with_operation("ListPets").with_status("200");
        assert_eq!(identifier.id_for(DocumentObject::Response, &loc), "ListPets_200");
        assert_eq!(
            identifier.id_for(DocumentObject::RequestBody, &loc),
            "ListPets_RequestBody"
        );

        let bare = Location::root().with_status("404");
        assert_eq!(identifier.id_for(DocumentObject::Response, &bare), "C_404");
    }

    #[test]
    fn test_media_type_id() {
        let loc = Location::root().child("application/vnd.api+json", "ListPets_200");
        assert_eq!(
            Identifier::default().id_for(DocumentObject::MediaType, &loc),
            "ListPets_200_application_vnd_api_json"
        );
    }

    #[test]
    fn test_example_link_callback_prefix_parent() {
        let identifier = Identifier::default();
        let loc = Location::root().child("next", "ListPets_200");
        assert_eq!(identifier.id_for(DocumentObject::Link, &loc), "ListPets_200_next");
        let orphan = Location {
            key: Some("sample".into()),
            ..Location::default()
        };
        assert_eq!(identifier.id_for(DocumentObject::Example, &orphan), "sample");
    }

    #[test]
    fn test_payload_schema_names() {
        let identifier = Identifier::default();
        let schema = Schema::typed("object").with_title("Ignored");
        let response = Location::root()
            .with_operation("ListPets")
            .with_status("200")
            .with_payload(Payload::Response);
        assert_eq!(identifier.schema_id(&schema, &response), "ListPets200Response");
        let request = Location::root()
            .with_operation("CreatePet")
            .with_payload(Payload::Request);
        assert_eq!(identifier.schema_id(&schema, &request), "CreatePetRequest");
    }

    #[test]
    fn test_schema_title_then_component_key() {
        let identifier = Identifier::default();
        let loc = Location::component_schema("Pet");
        assert_eq!(identifier.schema_id(&Schema::typed("object"), &loc), "Pet");
        assert_eq!(
            identifier.schema_id(&Schema::typed("object").with_title("Animal Record"), &loc),
            "Animal_Record"
        );
    }

    #[test]
    fn test_nested_schema_ids() {
        let identifier = Identifier::default();
        let pet = Location::component_schema("Pet");
        let owner = pet.child("properties", "Pet").child("owner", "Pet");
        assert_eq!(identifier.schema_id(&Schema::default(), &owner), "Pet_owner");

        let variant = owner.child("oneOf", "Pet_owner").indexed(1, "Pet_owner");
        assert_eq!(identifier.schema_id(&Schema::default(), &variant), "Pet_owner_oneOf_1");
    }

    #[test]
    fn test_derive_from_path() {
        let path = JsonPath::component_schema("Pet")
            .key("properties")
            .key("tags")
            .key("items");
        assert_eq!(derive_from_path(&path, "Schema"), "Pet_tags_items");

        let payload = JsonPath::root()
            .key("paths")
            .key("/pets")
            .key("get")
            .key("parameters")
            .index(0)
            .key("schema")
            .key("allOf")
            .index(2);
        assert_eq!(derive_from_path(&payload, "limit"), "limit_allOf_2");
    }

    #[test]
    fn test_unknown_falls_back_to_type_name() {
        let id = Identifier::default().id_for(
            DocumentObject::Unknown(std::any::type_name::<crate::openapi::Server>()),
            &Location::root(),
        );
        assert_eq!(id, "Server");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(Identifier::new(true).display_name("com.acme.Pet"), "Pet");
        assert_eq!(Identifier::new(false).display_name("com.acme.Pet"), "com.acme.Pet");
    }

    #[test]
    fn test_ref_id() {
        assert_eq!(Identifier::default().ref_id("#/components/schemas/Pet"), "Pet");
        assert_eq!(Identifier::default().ref_id("#/components/schemas/pet-v2"), "pet_v2");
    }
}
