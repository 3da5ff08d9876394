//! oasdiagram - Turn OpenAPI 3 documents into class diagrams
//!
//! Every schema, operation, parameter, response and the other document
//! objects become classes; references, composition and containment become
//! relationships. The diagram renders as Mermaid `classDiagram` text or as
//! JSON.
//!
//! # Quick Start
//!
//! ```rust
//! use oasdiagram::render;
//!
//! let input = r#"
//! openapi: 3.0.3
//! info: {title: Pets, version: '1.0'}
//! paths: {}
//! components:
//!   schemas:
//!     Pet:
//!       required: [id]
//!       properties:
//!         id: {type: integer}
//!         name: {type: string}
//! "#;
//! let diagram = render(input).unwrap();
//! assert!(diagram.starts_with("classDiagram"));
//! assert!(diagram.contains("+integer id"));
//! ```
//!
//! # Advanced Usage
//!
//! ```rust
//! use oasdiagram::prelude::*;
//!
//! let document = oasdiagram::parse("openapi: 3.1.0\ninfo: {title: t, version: '1'}\ncomponents:\n  schemas:\n    Tag:\n      properties:\n        label: {type: string}\n").unwrap();
//!
//! let mut config = Config::default();
//! config.include_operations = false;
//! let diagram = DiagramBuilder::new(&document, &config).build_schemas();
//! assert_eq!(diagram.class_count(), 1);
//!
//! let text = MermaidRenderer::new().render(&diagram).unwrap();
//! assert!(text.contains("+string? label"));
//! ```

pub mod analysis;
pub mod builder;
pub mod core;
pub mod identifier;
pub mod model;
pub mod openapi;
pub mod orchestrator;
pub mod render;

pub use core::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::builder::DiagramBuilder;
    pub use crate::core::{
        CancellationToken, Config, Database, Detector, DiagramError, OutputFormat, Parser,
        Renderer,
    };
    pub use crate::model::{
        Class, ClassDiagram, ClassKind, Method, Property, Relationship, RelationshipKind,
        Visibility,
    };
    pub use crate::openapi::{DocumentDetector, DocumentParser, OpenApi, Schema};
    pub use crate::orchestrator::Orchestrator;
    pub use crate::render::{JsonRenderer, MermaidRenderer};
}

/// Render an OpenAPI document (JSON or YAML) with the default configuration
///
/// # Example
/// ```rust
/// let out = oasdiagram::render("{\"openapi\": \"3.0.0\", \"info\": {\"title\": \"t\", \"version\": \"1\"}}").unwrap();
/// assert!(out.contains("class Document"));
/// ```
pub fn render(input: &str) -> anyhow::Result<String> {
    render_with_config(input, &Config::default())
}

/// Render an OpenAPI document with a specific configuration
///
/// Invalid configuration values fall back to their defaults.
pub fn render_with_config(input: &str, config: &Config) -> anyhow::Result<String> {
    use crate::orchestrator::Orchestrator;

    Orchestrator::with_default_plugins()
        .with_config(config.clone())
        .process(input)
}

/// Parse an OpenAPI 3.x document without building a diagram
///
/// # Example
/// ```rust
/// let document = oasdiagram::parse("openapi: 3.0.1\ninfo: {title: t, version: '1'}\n").unwrap();
/// assert_eq!(document.openapi, "3.0.1");
/// assert!(oasdiagram::parse("swagger: '2.0'\n").is_err());
/// ```
pub fn parse(input: &str) -> anyhow::Result<openapi::OpenApi> {
    use crate::core::Parser as _;

    openapi::DocumentParser::new().parse(input)
}

/// Build the diagram of a parsed document, post-passes included
pub fn build(document: &openapi::OpenApi, config: &Config) -> model::ClassDiagram {
    orchestrator::Orchestrator::new()
        .with_config(config.clone())
        .build_diagram(document)
}
