//! Diagram builder
//!
//! Walks an [`OpenApi`] document and fills a [`ClassDiagram`]. Every
//! reachable schema becomes at most one class:
//!
//! - a visited set keyed by JSON path stops repeated traversal, and a direct
//!   re-visit is drawn as a `circular` dependency;
//! - references are followed through the component they point at, so every
//!   `$ref` to a schema lands on the same canonical class;
//! - composition members absorbed by their parent (flattened `allOf`
//!   members, union variants) are owned by the parent and never visited on
//!   their own.
//!
//! The builder owns the diagram exclusively while it runs, so appends happen
//! in a single, deterministic order.

mod composition;
mod document;
mod property;
mod schema;

pub use property::*;

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, span, trace, Level};

use crate::analysis::{
    DiscriminatorAnalyzer, EnumAnalyzer, ExternalRefHandler, InheritanceAnalyzer,
    RelationshipAnalyzer,
};
use crate::core::{CancellationToken, Config};
use crate::identifier::{sanitize_id, DocumentObject, Identifier, Location};
use crate::model::{Class, ClassDiagram, Relationship, RelationshipKind};
use crate::openapi::{JsonPath, OpenApi, PathSegment};

/// Traversal bookkeeping
#[derive(Debug, Default)]
struct BuildState {
    /// JSON paths already entered
    visited: HashSet<JsonPath>,
    /// Paths absorbed by a parent class; visiting them is a silent no-op
    owned: HashSet<JsonPath>,
    /// Class that stands for the schema at a path (its own class, a union
    /// placeholder, or the class of a referenced component)
    representatives: HashMap<JsonPath, String>,
    /// Classes under construction, outermost first
    in_progress: Vec<String>,
    /// Nesting of inline property objects promoted to classes
    nesting: usize,
    /// Tag namespace of the operation being walked
    operation_namespace: Option<String>,
    /// IDs of the component schema classes, claimed before any other class
    schema_ids: HashSet<String>,
    /// Class ID given to each (object kind, derived ID) pair
    object_ids: HashMap<(&'static str, String), String>,
    /// Every ID handed out to a non-schema object
    object_classes: HashSet<String>,
}

/// Builds a class diagram from an OpenAPI document
pub struct DiagramBuilder<'a> {
    document: &'a OpenApi,
    config: &'a Config,
    identifier: Identifier,
    enums: EnumAnalyzer,
    discriminators: DiscriminatorAnalyzer,
    inheritance: InheritanceAnalyzer,
    relationships: RelationshipAnalyzer,
    external: ExternalRefHandler,
    cancel: CancellationToken,
    state: BuildState,
}

impl<'a> DiagramBuilder<'a> {
    pub fn new(document: &'a OpenApi, config: &'a Config) -> Self {
        Self {
            document,
            config,
            identifier: Identifier::new(config.simplify_names),
            enums: EnumAnalyzer::new(
                config.schema.enum_visualization,
                config.schema.max_inline_enum_values,
            ),
            discriminators: DiscriminatorAnalyzer::new(),
            inheritance: InheritanceAnalyzer::new(),
            relationships: RelationshipAnalyzer::new(config.general_depth()),
            external: ExternalRefHandler::new(config.relation.simplify_references),
            cancel: CancellationToken::new(),
            state: BuildState::default(),
        }
    }

    /// Stop dispatching new visits once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Walk the whole document into a new diagram
    pub fn build(mut self) -> ClassDiagram {
        let mut diagram = ClassDiagram::with_config(self.config.clone());
        self.build_into(&mut diagram);
        diagram
    }

    /// Walk the whole document into `diagram`
    pub fn build_into(&mut self, diagram: &mut ClassDiagram) {
        let build_span = span!(
            Level::INFO,
            "build_diagram",
            paths = self.document.paths.len(),
            schemas = self.document.component_schemas().count()
        );
        let _enter = build_span.enter();

        self.walk_document(diagram);

        info!(
            classes = diagram.class_count(),
            relationships = diagram.relationship_count(),
            cancelled = self.cancel.is_cancelled(),
            "Diagram built"
        );
    }

    /// Walk only the component schemas, without any other document object
    pub fn build_schemas(mut self) -> ClassDiagram {
        let mut diagram = ClassDiagram::with_config(self.config.clone());
        self.visit_component_schemas(&mut diagram, None);
        debug!(classes = diagram.class_count(), "Component schemas built");
        diagram
    }

    /// Whether new class work may start
    fn can_create(&self, diagram: &ClassDiagram) -> bool {
        if self.cancel.is_cancelled() {
            trace!("Cancelled, not dispatching new work");
            return false;
        }
        match self.config.max_complexity() {
            Some(cap) if diagram.class_count() + self.state.in_progress.len() >= cap => {
                trace!(cap, "Class cap reached");
                false
            }
            _ => true,
        }
    }

    fn is_in_progress(&self, id: &str) -> bool {
        self.state.in_progress.iter().any(|c| c == id)
    }

    /// Namespace for a class at `path` when namespaces are enabled
    fn namespace_for(&self, path: &JsonPath) -> Option<String> {
        if !self.config.use_namespaces {
            return None;
        }
        match path.segments().first() {
            Some(PathSegment::Key(first)) if first == "components" => Some("components".to_string()),
            Some(PathSegment::Key(first)) if first == "paths" => Some(
                self.state
                    .operation_namespace
                    .clone()
                    .unwrap_or_else(|| "paths".to_string()),
            ),
            _ => None,
        }
    }

    /// Claim the IDs of all component schemas ahead of the document walk
    fn reserve_schema_ids(&mut self) {
        let document = self.document;
        for (name, schema) in document.component_schemas() {
            let id = self.identifier.schema_id(schema, &Location::component_schema(name));
            self.state.schema_ids.insert(id);
        }
    }

    fn id_taken(&self, diagram: &ClassDiagram, id: &str) -> bool {
        self.state.schema_ids.contains(id)
            || self.state.object_classes.contains(id)
            || diagram.has_class(id)
    }

    /// Class ID for a non-schema object at `location`
    pub(super) fn object_id(
        &mut self,
        diagram: &ClassDiagram,
        object: DocumentObject<'_>,
        location: &Location,
    ) -> String {
        let base = self.identifier.id_for(object, location);
        self.claim_object_id(diagram, object.kind(), base)
    }

    /// Map `base` to an ID no schema class uses
    ///
    /// The same kind and base always get the same ID. A base already held by
    /// a schema or by another kind of object is qualified with the kind, then
    /// numbered.
    pub(super) fn claim_object_id(&mut self, diagram: &ClassDiagram, kind: &'static str, base: String) -> String {
        let key = (kind, base);
        if let Some(id) = self.state.object_ids.get(&key) {
            return id.clone();
        }
        let base = &key.1;
        let mut id = base.clone();
        if self.id_taken(diagram, &id) {
            let qualified = if base == kind {
                format!("{}Object", base)
            } else {
                sanitize_id(&format!("{}_{}", base, kind))
            };
            id = qualified.clone();
            let mut counter = 2;
            while self.id_taken(diagram, &id) {
                id = format!("{}_{}", qualified, counter);
                counter += 1;
            }
            debug!(base = base.as_str(), id = id.as_str(), kind, "Object ID qualified to avoid a clash");
        }
        self.state.object_classes.insert(id.clone());
        self.state.object_ids.insert(key, id.clone());
        id
    }

    /// ID already given to an object of `kind` derived as `base`
    pub(super) fn claimed_object_id(&self, kind: &'static str, base: &str) -> Option<&String> {
        self.state.object_ids.get(&(kind, base.to_string()))
    }

    /// Keep a schema class ID clear of IDs handed to other objects
    pub(super) fn schema_class_id(&self, id: String) -> String {
        if !self.state.object_classes.contains(&id) {
            return id;
        }
        let qualified = sanitize_id(&format!("{}_Schema", id));
        let mut candidate = qualified.clone();
        let mut counter = 2;
        while self.state.object_classes.contains(&candidate) {
            candidate = format!("{}_{}", qualified, counter);
            counter += 1;
        }
        candidate
    }

    /// Start a class with the ID, display name and namespace for `location`
    fn new_class(&self, id: &str, label: &str, location: &Location) -> Class {
        let mut class = Class::new(id, self.identifier.display_name(label));
        class.namespace = self.namespace_for(&location.path);
        class
    }

    /// Append a finished class, returning its stored ID
    fn finish_class(&self, diagram: &mut ClassDiagram, class: Class) -> String {
        let id = sanitize_id(&class.id);
        trace!(id = id.as_str(), properties = class.properties.len(), "Class added");
        diagram.add_class(class);
        id
    }

    /// Record a `circular` dependency from `parent` to `target`
    fn circular_edge(&self, diagram: &mut ClassDiagram, parent: Option<&str>, target: &str) {
        if let Some(parent) = parent {
            trace!(parent, target, "Circular reference");
            diagram.add_relationship(
                Relationship::new(parent, target, RelationshipKind::Dependency).with_label("circular"),
            );
        }
    }
}
