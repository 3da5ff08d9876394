//! Non-schema document objects
//!
//! The document root, info, servers, tags, components, paths and everything
//! hanging off an operation each get a class, appended before the objects
//! they contain. Containment edges are labelled with the slot the member
//! fills and marked structural; edges reached through a `$ref` are not, so
//! they count as usage.

use tracing::{debug, span, trace, Level};

use crate::analysis::{base_type, format_value, item_type};
use crate::identifier::{operation_name, sanitize_id, DocumentObject, Location, Payload};
use crate::model::{ClassDiagram, Method, Property, Relationship, RelationshipKind};
use crate::openapi::{
    component_target, Callback, Components, Example, Header, JsonPath, Link, MediaType, Operation,
    Parameter, PathItem, RefOr, RequestBody, Response, Schema, SecurityScheme,
};

use super::DiagramBuilder;

/// Read-only field shown as `+string <name> = <value>`
fn field(name: &str, value: impl Into<String>) -> Property {
    Property::new(name, "string").with_required(true).with_default(value)
}

/// The object behind `item`, the location to diagram it at, and whether it
/// was reached through a reference
fn deref_item<'x, T>(
    item: &'x RefOr<T>,
    location: &Location,
    resolve: impl FnOnce(&str) -> Option<&'x T>,
) -> Option<(&'x T, Location, bool)> {
    match item {
        RefOr::Item(inner) => Some((inner, location.clone(), false)),
        RefOr::Ref { reference } => {
            let target = resolve(reference)?;
            let (_, name) = component_target(reference)?;
            let path = JsonPath::from_pointer(reference)?;
            let location = Location {
                path,
                key: Some(name),
                ..Location::default()
            };
            Some((target, location, true))
        }
    }
}

/// Location of a component entry, owned by no class
fn component_entry(section: &str, name: &str) -> Location {
    Location {
        path: JsonPath::root().key("components").key(section).key(name),
        key: Some(name.to_string()),
        ..Location::default()
    }
}

/// Whether a schema under a parameter, header or media type deserves a class
fn worth_a_class(schema: &Schema) -> bool {
    if schema.title().is_some() || !schema.properties.is_empty() || schema.has_composition() {
        return true;
    }
    schema
        .items
        .as_deref()
        .is_some_and(|items| items.is_ref() || !items.properties.is_empty() || items.has_composition())
}

/// Short type of a payload schema that gets no class of its own
fn plain_type(schema: &Schema) -> String {
    if schema.is_array() {
        format!("{}[]", item_type(schema))
    } else {
        base_type(schema).to_string()
    }
}

impl<'a> DiagramBuilder<'a> {
    pub(super) fn walk_document(&mut self, diagram: &mut ClassDiagram) {
        let document = self.document;
        let root = Location::root();
        self.reserve_schema_ids();

        let doc_id = self.object_id(diagram, DocumentObject::Document, &root);
        if !self.can_create(diagram) {
            return;
        }
        let mut class = self.new_class(&doc_id, "Document", &root);
        class.add_property(field("openapi", document.openapi.clone()));
        let doc_id = self.finish_class(diagram, class);

        let info_location = root.child("info", &doc_id);
        let info_id = self.object_id(diagram, DocumentObject::Info, &info_location);
        if self.can_create(diagram) {
            let info = &document.info;
            let label = if info.title.is_empty() { "Info" } else { info.title.as_str() };
            let mut class = self.new_class(&info_id, label, &info_location);
            class.add_property(field("title", info.title.clone()));
            class.add_property(field("version", info.version.clone()));
            let info_id = self.finish_class(diagram, class);
            self.member_edge(diagram, &doc_id, &info_id, RelationshipKind::Composition, "info", false);
        }

        for (index, server) in document.servers.iter().enumerate() {
            let location = root.child("servers", &doc_id).indexed(index, &doc_id);
            let id = self.object_id(diagram, DocumentObject::Server(index), &location);
            if diagram.has_class(&id) || !self.can_create(diagram) {
                continue;
            }
            let mut class = self.new_class(&id, &server.url, &location);
            class.add_property(field("url", server.url.clone()));
            let id = self.finish_class(diagram, class);
            self.member_edge(diagram, &doc_id, &id, RelationshipKind::Composition, "server", false);
        }

        for tag in &document.tags {
            if let Some(id) = self.tag_class(diagram, &tag.name, tag.description.as_deref()) {
                self.member_edge(diagram, &doc_id, &id, RelationshipKind::Aggregation, "tag", false);
            }
        }

        if let Some(components) = &document.components {
            self.walk_components(diagram, &doc_id, components);
        }

        if self.config.include_operations && !document.paths.is_empty() {
            self.walk_paths(diagram, &doc_id);
        } else if !self.config.include_operations {
            debug!("Operations disabled, skipping paths");
        }

        for requirement in &document.security {
            for scheme in requirement.keys() {
                self.security_edge(diagram, &doc_id, scheme);
            }
        }
    }

    /// Edge from a container to one of its members
    fn member_edge(
        &self,
        diagram: &mut ClassDiagram,
        owner: &str,
        member: &str,
        kind: RelationshipKind,
        slot: &str,
        via_ref: bool,
    ) {
        let edge = Relationship::new(owner, member, kind).with_label(slot);
        diagram.add_relationship(if via_ref { edge } else { edge.structural() });
    }

    fn security_edge(&self, diagram: &mut ClassDiagram, owner: &str, scheme: &str) {
        let Some(scheme_id) = self.claimed_object_id("SecurityScheme", &sanitize_id(scheme)).cloned() else {
            return;
        };
        if diagram.has_class(&scheme_id) {
            diagram.add_relationship(
                Relationship::new(owner, scheme_id, RelationshipKind::Dependency).with_label("security"),
            );
        }
    }

    fn tag_class(&mut self, diagram: &mut ClassDiagram, name: &str, description: Option<&str>) -> Option<String> {
        let location = Location::root().child("tags", "Document");
        let id = self.object_id(diagram, DocumentObject::Tag(name), &location);
        if diagram.has_class(&id) {
            return Some(id);
        }
        if !self.can_create(diagram) {
            return None;
        }
        let mut class = self.new_class(&id, name, &location).with_annotation("tag");
        if let Some(description) = description {
            class.metadata.insert("description".to_string(), description.to_string());
        }
        Some(self.finish_class(diagram, class))
    }

    fn walk_components(&mut self, diagram: &mut ClassDiagram, doc_id: &str, components: &'a Components) {
        let document = self.document;
        let location = Location::root().child("components", doc_id);
        let id = self.object_id(diagram, DocumentObject::Components, &location);
        if !self.can_create(diagram) {
            return;
        }
        let class = self.new_class(&id, "Components", &location);
        let id = self.finish_class(diagram, class);
        self.member_edge(diagram, doc_id, &id, RelationshipKind::Composition, "components", false);

        let components_span = span!(Level::DEBUG, "walk_components");
        let _enter = components_span.enter();

        self.visit_component_schemas(diagram, Some(&id));

        for (name, item) in &components.security_schemes {
            let entry = component_entry("securitySchemes", name);
            let Some((scheme, location, _)) =
                deref_item(item, &entry, |r| document.resolve_security_scheme(r))
            else {
                continue;
            };
            if let Some(member) = self.walk_security_scheme(diagram, scheme, &location) {
                self.member_edge(diagram, &id, &member, RelationshipKind::Aggregation, "security", false);
            }
        }
        for (name, item) in &components.parameters {
            let entry = component_entry("parameters", name);
            if let Some((member, _)) = self.walk_parameter_ref(diagram, item, &entry) {
                self.member_edge(diagram, &id, &member, RelationshipKind::Aggregation, "parameter", false);
            }
        }
        for (name, item) in &components.request_bodies {
            let entry = component_entry("requestBodies", name);
            if let Some((member, _)) = self.walk_request_body_ref(diagram, item, &entry) {
                self.member_edge(diagram, &id, &member, RelationshipKind::Aggregation, "requestBody", false);
            }
        }
        for (name, item) in &components.responses {
            let entry = component_entry("responses", name);
            if let Some((member, _)) = self.walk_response_ref(diagram, item, &entry) {
                self.member_edge(diagram, &id, &member, RelationshipKind::Aggregation, "response", false);
            }
        }
        for (name, item) in &components.headers {
            let entry = component_entry("headers", name);
            if let Some((member, _)) = self.walk_header_ref(diagram, item, &entry) {
                self.member_edge(diagram, &id, &member, RelationshipKind::Aggregation, "header", false);
            }
        }
        for (name, item) in &components.examples {
            let entry = component_entry("examples", name);
            if let Some((member, _)) = self.walk_example_ref(diagram, item, &entry) {
                self.member_edge(diagram, &id, &member, RelationshipKind::Aggregation, "example", false);
            }
        }
        for (name, item) in &components.links {
            let entry = component_entry("links", name);
            if let Some((member, _)) = self.walk_link_ref(diagram, item, &entry) {
                self.member_edge(diagram, &id, &member, RelationshipKind::Aggregation, "link", false);
            }
        }
        for (name, item) in &components.callbacks {
            let entry = component_entry("callbacks", name);
            if let Some((member, _)) = self.walk_callback_ref(diagram, item, &entry) {
                self.member_edge(diagram, &id, &member, RelationshipKind::Aggregation, "callback", false);
            }
        }
    }

    fn walk_paths(&mut self, diagram: &mut ClassDiagram, doc_id: &str) {
        let document = self.document;
        let location = Location::root().child("paths", doc_id);
        let id = self.object_id(diagram, DocumentObject::Paths, &location);
        if !self.can_create(diagram) {
            return;
        }
        let class = self.new_class(&id, "Paths", &location);
        let id = self.finish_class(diagram, class);
        self.member_edge(diagram, doc_id, &id, RelationshipKind::Composition, "paths", false);

        for (path, item) in &document.paths {
            if self.cancel.is_cancelled() {
                break;
            }
            if !self.config.filter.allows_path(path) {
                trace!(path = path.as_str(), "Path filtered out");
                continue;
            }
            let item_location = location.child(path.clone(), &id);
            if let Some(member) = self.walk_path_item(diagram, path, item, &item_location, None) {
                self.member_edge(diagram, &id, &member, RelationshipKind::Composition, path, false);
            }
        }
    }

    fn allows_operation(&self, operation: &Operation) -> bool {
        if self.config.filter.exclude_deprecated && operation.deprecated {
            return false;
        }
        self.config.filter.allows_tags(&operation.tags)
    }

    /// Path item class with one method per operation kept by the filters
    fn walk_path_item(
        &mut self,
        diagram: &mut ClassDiagram,
        path: &str,
        item: &'a PathItem,
        location: &Location,
        prefix: Option<&str>,
    ) -> Option<String> {
        let operations: Vec<_> = item
            .operations()
            .into_iter()
            .filter(|(_, operation)| self.allows_operation(operation))
            .collect();
        if operations.is_empty() {
            trace!(path, "No operations left after filtering");
            return None;
        }

        let base = self.identifier.id_for(DocumentObject::PathItem(path), location);
        let base = match prefix {
            Some(prefix) => sanitize_id(&format!("{}_{}", prefix, base)),
            None => base,
        };
        let id = self.claim_object_id(diagram, "PathItem", base);
        if diagram.has_class(&id) {
            return Some(id);
        }
        if !self.can_create(diagram) {
            return None;
        }

        let mut class = self.new_class(&id, path, location);
        for (method, operation) in &operations {
            let name = operation_name(method, path, operation.operation_id.as_deref());
            let parameters = self.parameter_names(item, operation).join(", ");
            class.add_method(
                Method::new(*method)
                    .with_parameters(parameters)
                    .with_return_type(self.return_type(operation, &name)),
            );
        }
        let id = self.finish_class(diagram, class);

        for (index, parameter) in item.parameters.iter().enumerate() {
            let parameter_location = location.child("parameters", &id).indexed(index, &id);
            if let Some((member, via_ref)) = self.walk_parameter_ref(diagram, parameter, &parameter_location) {
                self.member_edge(diagram, &id, &member, RelationshipKind::Composition, "parameter", via_ref);
            }
        }

        for (method, operation) in operations {
            let name = operation_name(method, path, operation.operation_id.as_deref());
            let operation_location = location.child(method, &id).with_operation(name);
            if let Some(member) =
                self.walk_operation(diagram, method, path, operation, &operation_location)
            {
                self.member_edge(diagram, &id, &member, RelationshipKind::Composition, method, false);
            }
        }
        Some(id)
    }

    /// Names of the parameters an operation takes, path-level ones first
    fn parameter_names(&self, item: &PathItem, operation: &Operation) -> Vec<String> {
        let document = self.document;
        item.parameters
            .iter()
            .chain(operation.parameters.iter())
            .filter_map(|parameter| match parameter {
                RefOr::Item(parameter) => Some(parameter.name.clone()),
                RefOr::Ref { reference } => document
                    .resolve_parameter(reference)
                    .map(|parameter| parameter.name.clone()),
            })
            .collect()
    }

    /// Return type of an operation: the payload of its first 2xx response
    fn return_type(&self, operation: &Operation, name: &str) -> String {
        let document = self.document;
        let success = operation
            .responses
            .iter()
            .find(|(status, _)| status.starts_with('2'));
        let Some((status, response)) = success else {
            return "void".to_string();
        };
        let response = match response {
            RefOr::Item(response) => Some(response),
            RefOr::Ref { reference } => document.resolve_response(reference),
        };
        let Some(schema) = response
            .and_then(|response| response.content.values().find_map(|media| media.schema.as_ref()))
        else {
            return "void".to_string();
        };
        if let Some(reference) = schema.reference_path() {
            return self.identifier.ref_id(reference);
        }
        if worth_a_class(schema) {
            let location = Location::root()
                .with_operation(name)
                .with_status(status.clone())
                .with_payload(Payload::Response);
            return self.identifier.schema_id(schema, &location);
        }
        plain_type(schema)
    }

    fn walk_operation(
        &mut self,
        diagram: &mut ClassDiagram,
        method: &str,
        path: &str,
        operation: &'a Operation,
        location: &Location,
    ) -> Option<String> {
        let document = self.document;
        let id = self.object_id(diagram, DocumentObject::Operation, location);
        if diagram.has_class(&id) {
            return Some(id);
        }
        if !self.can_create(diagram) {
            return None;
        }

        let previous = std::mem::replace(
            &mut self.state.operation_namespace,
            operation.tags.first().cloned(),
        );
        let operation_span = span!(Level::TRACE, "walk_operation", id = id.as_str());
        let _enter = operation_span.enter();

        let label = operation
            .operation_id
            .clone()
            .unwrap_or_else(|| format!("{} {}", method.to_uppercase(), path));
        let mut class = self.new_class(&id, &label, location);
        if operation.deprecated {
            class.add_annotation("deprecated");
        }
        class.add_property(field("method", method.to_uppercase()));
        class.add_property(field("path", path));
        if let Some(summary) = &operation.summary {
            class.add_property(field("summary", summary.clone()));
        }
        let id = self.finish_class(diagram, class);

        for tag in &operation.tags {
            if let Some(tag_id) = self.tag_class(diagram, tag, None) {
                diagram.add_relationship(
                    Relationship::new(&id, tag_id, RelationshipKind::Dependency).with_label("tag"),
                );
            }
        }

        for (index, parameter) in operation.parameters.iter().enumerate() {
            let parameter_location = location.child("parameters", &id).indexed(index, &id);
            if let Some((member, via_ref)) = self.walk_parameter_ref(diagram, parameter, &parameter_location) {
                self.member_edge(diagram, &id, &member, RelationshipKind::Composition, "parameter", via_ref);
            }
        }

        if let Some(body) = &operation.request_body {
            let body_location = location.child("requestBody", &id);
            if let Some((member, via_ref)) = self.walk_request_body_ref(diagram, body, &body_location) {
                self.member_edge(diagram, &id, &member, RelationshipKind::Composition, "requestBody", via_ref);
            }
        }

        if !operation.responses.is_empty() {
            let responses_location = location.child("responses", &id);
            let responses_id = self.object_id(diagram, DocumentObject::Responses, &responses_location);
            if self.can_create(diagram) {
                let class = self.new_class(&responses_id, "Responses", &responses_location);
                let responses_id = self.finish_class(diagram, class);
                self.member_edge(diagram, &id, &responses_id, RelationshipKind::Composition, "responses", false);

                for (status, response) in &operation.responses {
                    let response_location = responses_location
                        .child(status.clone(), &responses_id)
                        .with_status(status.clone());
                    if let Some((member, via_ref)) =
                        self.walk_response_ref(diagram, response, &response_location)
                    {
                        self.member_edge(diagram, &responses_id, &member, RelationshipKind::Composition, status, via_ref);
                    }
                }
            }
        }

        for (key, callback) in &operation.callbacks {
            let callback_location = location.child("callbacks", &id).child(key.clone(), &id);
            if let Some((member, via_ref)) = self.walk_callback_ref(diagram, callback, &callback_location) {
                self.member_edge(diagram, &id, &member, RelationshipKind::Composition, key, via_ref);
            }
        }

        let requirements = operation.security.as_ref().unwrap_or(&document.security);
        for requirement in requirements {
            for scheme in requirement.keys() {
                self.security_edge(diagram, &id, scheme);
            }
        }

        self.state.operation_namespace = previous;
        Some(id)
    }

    fn walk_parameter_ref(
        &mut self,
        diagram: &mut ClassDiagram,
        item: &'a RefOr<Parameter>,
        location: &Location,
    ) -> Option<(String, bool)> {
        let document = self.document;
        let (parameter, location, via_ref) = deref_item(item, location, |r| document.resolve_parameter(r))?;
        self.walk_parameter(diagram, parameter, &location).map(|id| (id, via_ref))
    }

    fn walk_parameter(
        &mut self,
        diagram: &mut ClassDiagram,
        parameter: &'a Parameter,
        location: &Location,
    ) -> Option<String> {
        let id = self.object_id(diagram, DocumentObject::Parameter(parameter), location);
        if diagram.has_class(&id) {
            return Some(id);
        }
        if !self.can_create(diagram) {
            return None;
        }
        let mut class = self.new_class(&id, &parameter.name, location).with_annotation("parameter");
        if parameter.deprecated {
            class.add_annotation("deprecated");
        }
        class.add_property(field("in", parameter.location.clone()));
        if let Some(schema) = &parameter.schema {
            class.add_property(self.value_property(&parameter.name, schema, parameter.required));
        }
        let id = self.finish_class(diagram, class);

        if let Some(schema) = &parameter.schema {
            self.attach_schema(diagram, &id, schema, &location.child("schema", &id));
        }
        Some(id)
    }

    fn walk_header_ref(
        &mut self,
        diagram: &mut ClassDiagram,
        item: &'a RefOr<Header>,
        location: &Location,
    ) -> Option<(String, bool)> {
        let document = self.document;
        let (header, location, via_ref) = deref_item(item, location, |r| document.resolve_header(r))?;
        self.walk_header(diagram, header, &location).map(|id| (id, via_ref))
    }

    fn walk_header(&mut self, diagram: &mut ClassDiagram, header: &'a Header, location: &Location) -> Option<String> {
        let id = self.object_id(diagram, DocumentObject::Header, location);
        if diagram.has_class(&id) {
            return Some(id);
        }
        if !self.can_create(diagram) {
            return None;
        }
        let label = location.key.clone().unwrap_or_else(|| id.clone());
        let mut class = self.new_class(&id, &label, location).with_annotation("header");
        if header.deprecated {
            class.add_annotation("deprecated");
        }
        if let Some(schema) = &header.schema {
            class.add_property(self.value_property("value", schema, header.required));
        }
        let id = self.finish_class(diagram, class);

        if let Some(schema) = &header.schema {
            self.attach_schema(diagram, &id, schema, &location.child("schema", &id));
        }
        Some(id)
    }

    fn walk_request_body_ref(
        &mut self,
        diagram: &mut ClassDiagram,
        item: &'a RefOr<RequestBody>,
        location: &Location,
    ) -> Option<(String, bool)> {
        let document = self.document;
        let (body, location, via_ref) = deref_item(item, location, |r| document.resolve_request_body(r))?;
        self.walk_request_body(diagram, body, &location).map(|id| (id, via_ref))
    }

    fn walk_request_body(
        &mut self,
        diagram: &mut ClassDiagram,
        body: &'a RequestBody,
        location: &Location,
    ) -> Option<String> {
        let id = self.object_id(diagram, DocumentObject::RequestBody, location);
        if diagram.has_class(&id) {
            return Some(id);
        }
        if !self.can_create(diagram) {
            return None;
        }
        let mut class = self.new_class(&id, &id, location);
        class.add_property(field("required", body.required.to_string()));
        let id = self.finish_class(diagram, class);

        for (media_type, media) in &body.content {
            let media_location = location.child("content", &id).child(media_type.clone(), &id);
            if let Some(member) = self.walk_media_type(diagram, media, &media_location, Payload::Request) {
                self.member_edge(diagram, &id, &member, RelationshipKind::Composition, media_type, false);
            }
        }
        Some(id)
    }

    fn walk_response_ref(
        &mut self,
        diagram: &mut ClassDiagram,
        item: &'a RefOr<Response>,
        location: &Location,
    ) -> Option<(String, bool)> {
        let document = self.document;
        let (response, location, via_ref) = deref_item(item, location, |r| document.resolve_response(r))?;
        self.walk_response(diagram, response, &location).map(|id| (id, via_ref))
    }

    fn walk_response(
        &mut self,
        diagram: &mut ClassDiagram,
        response: &'a Response,
        location: &Location,
    ) -> Option<String> {
        let id = self.object_id(diagram, DocumentObject::Response, location);
        if diagram.has_class(&id) {
            return Some(id);
        }
        if !self.can_create(diagram) {
            return None;
        }
        let label = match (&location.operation, &location.status) {
            (Some(operation), Some(status)) => format!("{} {}", operation, status),
            _ => location.key.clone().unwrap_or_else(|| id.clone()),
        };
        let mut class = self.new_class(&id, &label, location);
        if !response.description.is_empty() {
            class.add_property(field("description", response.description.clone()));
        }
        let id = self.finish_class(diagram, class);

        for (name, header) in &response.headers {
            let header_location = location.child("headers", &id).child(name.clone(), &id);
            if let Some((member, via_ref)) = self.walk_header_ref(diagram, header, &header_location) {
                self.member_edge(diagram, &id, &member, RelationshipKind::Composition, name, via_ref);
            }
        }
        for (media_type, media) in &response.content {
            let media_location = location.child("content", &id).child(media_type.clone(), &id);
            if let Some(member) = self.walk_media_type(diagram, media, &media_location, Payload::Response) {
                self.member_edge(diagram, &id, &member, RelationshipKind::Composition, media_type, false);
            }
        }
        for (name, link) in &response.links {
            let link_location = location.child("links", &id).child(name.clone(), &id);
            if let Some((member, via_ref)) = self.walk_link_ref(diagram, link, &link_location) {
                self.member_edge(diagram, &id, &member, RelationshipKind::Aggregation, name, via_ref);
            }
        }
        Some(id)
    }

    fn walk_media_type(
        &mut self,
        diagram: &mut ClassDiagram,
        media: &'a MediaType,
        location: &Location,
        payload: Payload,
    ) -> Option<String> {
        let id = self.object_id(diagram, DocumentObject::MediaType, location);
        if diagram.has_class(&id) {
            return Some(id);
        }
        if !self.can_create(diagram) {
            return None;
        }
        let label = location.key.clone().unwrap_or_else(|| id.clone());
        let mut class = self.new_class(&id, &label, location);
        if let Some(example) = &media.example {
            class.metadata.insert("example".to_string(), format_value(example));
        }
        let id = self.finish_class(diagram, class);

        if let Some(schema) = &media.schema {
            let schema_location = location.child("schema", &id).with_payload(payload);
            self.attach_schema(diagram, &id, schema, &schema_location);
        }
        for (name, example) in &media.examples {
            let example_location = location.child("examples", &id).child(name.clone(), &id);
            if let Some((member, via_ref)) = self.walk_example_ref(diagram, example, &example_location) {
                self.member_edge(diagram, &id, &member, RelationshipKind::Aggregation, name, via_ref);
            }
        }
        Some(id)
    }

    fn walk_example_ref(
        &mut self,
        diagram: &mut ClassDiagram,
        item: &'a RefOr<Example>,
        location: &Location,
    ) -> Option<(String, bool)> {
        let document = self.document;
        let (example, location, via_ref) = deref_item(item, location, |r| document.resolve_example(r))?;
        let id = self.object_id(diagram, DocumentObject::Example, &location);
        if diagram.has_class(&id) {
            return Some((id, via_ref));
        }
        if !self.can_create(diagram) {
            return None;
        }
        let label = location.key.clone().unwrap_or_else(|| id.clone());
        let mut class = self.new_class(&id, &label, &location).with_annotation("example");
        if let Some(summary) = &example.summary {
            class.add_property(field("summary", summary.clone()));
        }
        if let Some(external) = &example.external_value {
            class.add_property(field("externalValue", external.clone()));
        }
        Some((self.finish_class(diagram, class), via_ref))
    }

    fn walk_link_ref(
        &mut self,
        diagram: &mut ClassDiagram,
        item: &'a RefOr<Link>,
        location: &Location,
    ) -> Option<(String, bool)> {
        let document = self.document;
        let (link, location, via_ref) = deref_item(item, location, |r| document.resolve_link(r))?;
        let id = self.object_id(diagram, DocumentObject::Link, &location);
        if diagram.has_class(&id) {
            return Some((id, via_ref));
        }
        if !self.can_create(diagram) {
            return None;
        }
        let label = location.key.clone().unwrap_or_else(|| id.clone());
        let mut class = self.new_class(&id, &label, &location).with_annotation("link");
        if let Some(operation_id) = &link.operation_id {
            class.add_property(field("operationId", operation_id.clone()));
        }
        if let Some(operation_ref) = &link.operation_ref {
            class.add_property(field("operationRef", operation_ref.clone()));
        }
        let id = self.finish_class(diagram, class);

        if let Some(operation_id) = &link.operation_id {
            let name = sanitize_id(&operation_name("", "", Some(operation_id)));
            let target = self.claimed_object_id("Operation", &name).cloned();
            if let Some(target) = target.filter(|t| diagram.has_class(t)) {
                diagram.add_relationship(
                    Relationship::new(&id, target, RelationshipKind::Dependency).with_label("operationId"),
                );
            }
        }
        Some((id, via_ref))
    }

    fn walk_callback_ref(
        &mut self,
        diagram: &mut ClassDiagram,
        item: &'a RefOr<Callback>,
        location: &Location,
    ) -> Option<(String, bool)> {
        let document = self.document;
        let (callback, location, via_ref) = deref_item(item, location, |r| document.resolve_callback(r))?;
        let id = self.object_id(diagram, DocumentObject::Callback, &location);
        if diagram.has_class(&id) {
            return Some((id, via_ref));
        }
        if !self.can_create(diagram) {
            return None;
        }
        let label = location.key.clone().unwrap_or_else(|| id.clone());
        let class = self.new_class(&id, &label, &location).with_annotation("callback");
        let id = self.finish_class(diagram, class);

        for (expression, path_item) in callback {
            let item_location = location.child(expression.clone(), &id);
            if let Some(member) = self.walk_path_item(diagram, expression, path_item, &item_location, Some(&id)) {
                self.member_edge(diagram, &id, &member, RelationshipKind::Composition, expression, false);
            }
        }
        Some((id, via_ref))
    }

    fn walk_security_scheme(
        &mut self,
        diagram: &mut ClassDiagram,
        scheme: &'a SecurityScheme,
        location: &Location,
    ) -> Option<String> {
        let id = self.object_id(diagram, DocumentObject::SecurityScheme, location);
        if diagram.has_class(&id) {
            return Some(id);
        }
        if !self.can_create(diagram) {
            return None;
        }
        let label = location.key.clone().unwrap_or_else(|| id.clone());
        let mut class = self.new_class(&id, &label, location).with_annotation("security");
        class.add_property(field("type", scheme.scheme_type.clone()));
        for (name, value) in [
            ("scheme", &scheme.scheme),
            ("bearerFormat", &scheme.bearer_format),
            ("in", &scheme.location),
            ("name", &scheme.name),
        ] {
            if let Some(value) = value {
                class.add_property(field(name, value.clone()));
            }
        }
        Some(self.finish_class(diagram, class))
    }

    /// The value property of a parameter or header
    fn value_property(&self, name: &str, schema: &Schema, required: bool) -> Property {
        let required_names = if required { vec![name.to_string()] } else { Vec::new() };
        let type_string = super::determine_property_type(
            schema,
            name,
            &required_names,
            self.config.relation.detect_polymorphism,
        )
        .type_string;
        let mut property = Property::new(name, type_string).with_required(required);
        property.nullable = schema.is_nullable();
        property
    }

    /// Link `owner` to the class of a schema it carries
    ///
    /// Payload schemas are named after their operation; other inline
    /// schemas after their owner.
    fn attach_schema(
        &mut self,
        diagram: &mut ClassDiagram,
        owner: &str,
        schema: &'a Schema,
        location: &Location,
    ) {
        let target = match schema.reference_path() {
            Some(reference) => self.visit_reference(diagram, reference, Some(owner)),
            None if worth_a_class(schema) => {
                let forced = (location.payload.is_none() && schema.title().is_none())
                    .then(|| sanitize_id(&format!("{}_schema", owner)));
                self.visit_schema_as(diagram, schema, location, forced)
            }
            None => None,
        };
        if let Some(target) = target {
            self.link(
                diagram,
                Relationship::new(owner, &target, RelationshipKind::Composition).with_label("schema"),
                schema.reference_path(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::openapi::OpenApi;

    const PETSTORE: &str = r#"
openapi: 3.0.3
info: {title: Petstore, version: 1.0.0}
servers:
  - url: https://petstore.example.com/v1
tags:
  - name: pets
paths:
  /pets:
    get:
      operationId: listPets
      tags: [pets]
      parameters:
        - $ref: '#/components/parameters/Limit'
        - name: offset
          in: query
          schema: {type: integer}
      responses:
        '200':
          description: A page of pets
          headers:
            X-Next: {schema: {type: string}}
          content:
            application/json:
              schema:
                type: array
                items: {$ref: '#/components/schemas/Pet'}
        default:
          $ref: '#/components/responses/GeneralError'
    post:
      operationId: createPet
      tags: [admin]
      deprecated: true
      requestBody:
        content:
          application/json:
            schema: {$ref: '#/components/schemas/Pet'}
      responses:
        '201': {description: Created}
  /internal/health:
    get:
      responses:
        '200': {description: ok}
components:
  parameters:
    Limit: {name: limit, in: query, schema: {type: integer, maximum: 100}}
  responses:
    GeneralError:
      description: Unexpected error
      content:
        application/json:
          schema: {$ref: '#/components/schemas/Error'}
  securitySchemes:
    api_key: {type: apiKey, name: X-API-Key, in: header}
  schemas:
    Pet:
      required: [id]
      properties:
        id: {type: integer}
        name: {type: string}
    Error:
      properties:
        message: {type: string}
security:
  - api_key: []
"#;

    fn petstore() -> OpenApi {
        serde_yaml::from_str(PETSTORE).unwrap()
    }

    fn has_edge(diagram: &ClassDiagram, source: &str, target: &str, label: &str) -> bool {
        diagram
            .relationships()
            .iter()
            .any(|r| r.source == source && r.target == target && r.label.as_deref() == Some(label))
    }

    #[test]
    fn test_document_objects_become_classes() {
        let document = petstore();
        let config = Config::default();
        let diagram = DiagramBuilder::new(&document, &config).build();

        for id in [
            "Document",
            "Info",
            "Server_0",
            "Tag_pets",
            "Components",
            "Paths",
            "PetsPath",
            "ListPets",
            "ListPets_Responses",
            "ListPets_200",
            "ListPets_200_application_json",
            "ListPets200Response",
            "X_Next",
            "limit",
            "offset",
            "Error",
            "GeneralError",
            "api_key",
            "Pet",
        ] {
            assert!(diagram.has_class(id), "missing class {}", id);
        }
        assert_eq!(diagram.classes()[0].id, "Document");
    }

    #[test]
    fn test_path_item_methods() {
        let document = petstore();
        let config = Config::default();
        let diagram = DiagramBuilder::new(&document, &config).build();

        let path = diagram.get_class("PetsPath").unwrap();
        assert_eq!(path.name, "/pets");
        let get = &path.methods[0];
        assert_eq!(get.name, "get");
        assert_eq!(get.parameters, "limit, offset");
        assert_eq!(get.return_type, "ListPets200Response");
        assert_eq!(path.methods[1].return_type, "void");
    }

    #[test]
    fn test_containment_edges() {
        let document = petstore();
        let config = Config::default();
        let diagram = DiagramBuilder::new(&document, &config).build();

        assert!(has_edge(&diagram, "Document", "Info", "info"));
        assert!(has_edge(&diagram, "Paths", "PetsPath", "/pets"));
        assert!(has_edge(&diagram, "PetsPath", "ListPets", "get"));
        assert!(has_edge(&diagram, "ListPets_Responses", "ListPets_200", "200"));
        assert!(has_edge(&diagram, "ListPets200Response", "Pet", "items"));
        assert!(has_edge(&diagram, "ListPets_Responses", "GeneralError", "default"));
        assert!(has_edge(&diagram, "GeneralError_application_json", "Error", "schema"));
        assert!(has_edge(&diagram, "ListPets", "Tag_pets", "tag"));
        assert!(has_edge(&diagram, "ListPets", "api_key", "security"));
        assert!(has_edge(&diagram, "CreatePet_RequestBody_application_json", "Pet", "schema"));

        let structural = diagram
            .relationships()
            .iter()
            .find(|r| r.source == "Components" && r.target == "Pet")
            .unwrap();
        assert!(structural.is_structural());
        let by_ref = diagram
            .relationships()
            .iter()
            .find(|r| r.source == "ListPets_Responses" && r.target == "GeneralError")
            .unwrap();
        assert!(!by_ref.is_structural());
    }

    #[test]
    fn test_operation_filters() {
        let document = petstore();
        let mut config = Config::default();
        config.filter.exclude_deprecated = true;
        config.filter.exclude_paths = vec!["/internal".to_string()];
        let diagram = DiagramBuilder::new(&document, &config).build();

        assert!(!diagram.has_class("CreatePet"));
        assert!(!diagram.has_class("InternalHealthPath"));
        assert_eq!(diagram.get_class("PetsPath").unwrap().methods.len(), 1);

        config.filter = Default::default();
        config.filter.include_tags = vec!["admin".to_string()];
        let diagram = DiagramBuilder::new(&document, &config).build();
        assert!(diagram.has_class("CreatePet"));
        assert!(!diagram.has_class("ListPets"));
    }

    #[test]
    fn test_include_operations_off_skips_paths() {
        let document = petstore();
        let mut config = Config::default();
        config.include_operations = false;
        let diagram = DiagramBuilder::new(&document, &config).build();

        assert!(!diagram.has_class("Paths"));
        assert!(!diagram.has_class("ListPets"));
        assert!(diagram.has_class("Pet"));
    }

    #[test]
    fn test_operation_namespace_uses_first_tag() {
        let document = petstore();
        let mut config = Config::default();
        config.use_namespaces = true;
        let diagram = DiagramBuilder::new(&document, &config).build();

        assert_eq!(diagram.get_class("ListPets").unwrap().namespace.as_deref(), Some("pets"));
        assert_eq!(diagram.get_class("PetsPath").unwrap().namespace.as_deref(), Some("paths"));
        assert_eq!(diagram.get_class("Pet").unwrap().namespace.as_deref(), Some("components"));
        assert_eq!(diagram.get_class("Document").unwrap().namespace, None);
    }
}
