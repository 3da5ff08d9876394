//! Pipeline orchestrator
//!
//! Runs the whole pipeline:
//! Detector → Parser → Builder → post-passes → Renderer

use std::collections::HashSet;

use anyhow::Result;
use indexmap::IndexMap;
use tracing::{debug, info, span, trace, warn, Level};

use crate::analysis::{ReferenceAggregator, UsageAnalyzer, DEFAULT_MIN_REFS_FOR_ANNOTATION};
use crate::builder::DiagramBuilder;
use crate::core::{CancellationToken, Config, Detector, DiagramError, OutputFormat, Parser, Renderer};
use crate::model::ClassDiagram;
use crate::openapi::{DocumentDetector, DocumentParser, OpenApi};
use crate::render::{JsonRenderer, MermaidRenderer};

/// Coordinates detection, parsing, diagram building and rendering
pub struct Orchestrator {
    detectors: IndexMap<String, Box<dyn Detector>>,
    parser: DocumentParser,
    config: Config,
    config_errors: Vec<String>,
    cancel: CancellationToken,
}

impl Orchestrator {
    /// Create an orchestrator with no detectors and the default config
    pub fn new() -> Self {
        Self {
            detectors: IndexMap::new(),
            parser: DocumentParser::new(),
            config: Config::default(),
            config_errors: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Create an orchestrator with the OpenAPI detector registered
    pub fn with_default_plugins() -> Self {
        let mut orchestrator = Self::new();
        orchestrator.register_detector("openapi".to_string(), Box::new(DocumentDetector::new()));
        orchestrator
    }

    /// Use `config`; invalid fields fall back to their defaults
    pub fn with_config(mut self, config: Config) -> Self {
        let (config, errors) = config.validated();
        debug!(errors = errors.len(), "Configuration validated");
        self.config = config;
        self.config_errors = errors;
        self
    }

    /// Share a cancellation token with the builder
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validation errors found by [`Orchestrator::with_config`]
    pub fn config_errors(&self) -> &[String] {
        &self.config_errors
    }

    /// Register a detector plugin
    pub fn register_detector(&mut self, name: String, detector: Box<dyn Detector>) {
        self.detectors.insert(name, detector);
    }

    /// Get available detector names
    pub fn get_detectors(&self) -> Vec<String> {
        self.detectors.keys().cloned().collect()
    }

    /// Detect the document type of the input text
    pub fn detect_document_type(&self, input: &str) -> Result<String> {
        let detect_span = span!(Level::INFO, "detect_document_type", input_len = input.len());
        let _enter = detect_span.enter();

        for (name, detector) in &self.detectors {
            let confidence = detector.confidence(input);
            trace!(detector = name.as_str(), confidence, "Checking detector");
            if detector.detect(input) {
                info!(detector = name.as_str(), confidence, "Detected document type");
                return Ok(name.clone());
            }
        }

        warn!("No suitable detector found for input");
        Err(DiagramError::detection_error("No suitable detector found for input".to_string()).into())
    }

    /// Parse the input into a document
    pub fn parse(&self, input: &str) -> Result<OpenApi> {
        self.parser.parse(input)
    }

    /// Build the diagram for a parsed document and run the post-passes
    pub fn build_diagram(&self, document: &OpenApi) -> ClassDiagram {
        let mut diagram = DiagramBuilder::new(document, &self.config)
            .with_cancellation(self.cancel.clone())
            .build();
        self.post_process(&mut diagram);
        diagram
    }

    /// Usage annotation, bidirectional marking and reference aggregation
    pub fn post_process(&self, diagram: &mut ClassDiagram) {
        let post_span = span!(Level::DEBUG, "post_process");
        let _enter = post_span.enter();

        let annotated = UsageAnalyzer::new(DEFAULT_MIN_REFS_FOR_ANNOTATION).annotate_with_usage(diagram);
        debug!(annotated, "Usage annotations added");

        if self.config.relation.detect_bidirectional {
            let marked = mark_bidirectional(diagram);
            debug!(marked, "Bidirectional relationships marked");
        }

        if self.config.relation.merge_duplicate_refs {
            let aggregator = ReferenceAggregator::default();
            if aggregator.should_aggregate(diagram.relationships()) {
                let before = diagram.relationship_count();
                let merged = aggregator.aggregate(diagram.relationships());
                diagram.replace_relationships(merged);
                debug!(before, after = diagram.relationship_count(), "Duplicate references merged");
            }
        }
    }

    /// Render the diagram in the configured output format
    pub fn render(&self, diagram: &ClassDiagram) -> Result<String> {
        match self.config.output.format {
            OutputFormat::Mermaid => MermaidRenderer::new().render(diagram),
            OutputFormat::Json => JsonRenderer::new().render(diagram),
        }
    }

    /// Process input through the complete pipeline
    pub fn process(&self, input: &str) -> Result<String> {
        let process_span = span!(Level::INFO, "process_document", input_len = input.len());
        let _enter = process_span.enter();

        info!("Starting document processing pipeline");

        let document_type = self.detect_document_type(input)?;
        debug!(document_type = document_type.as_str(), "Document type detected");

        let document = self.parse(input)?;
        let diagram = self.build_diagram(&document);
        let output = self.render(&diagram)?;

        info!(
            classes = diagram.class_count(),
            relationships = diagram.relationship_count(),
            output_len = output.len(),
            "Pipeline completed successfully"
        );
        Ok(output)
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

/// Mark non-structural edges A→B whose reverse B→A also exists
///
/// Sets metadata `bidirectional=true` on both edges and returns how many
/// edges were marked. Self-loops are left alone.
pub fn mark_bidirectional(diagram: &mut ClassDiagram) -> usize {
    let pairs: HashSet<(String, String)> = diagram
        .relationships()
        .iter()
        .filter(|r| !r.is_structural() && r.source != r.target)
        .map(|r| (r.source.clone(), r.target.clone()))
        .collect();

    let mut marked = 0;
    for relationship in diagram.relationships_mut() {
        if relationship.is_structural() || relationship.source == relationship.target {
            continue;
        }
        let reverse = (relationship.target.clone(), relationship.source.clone());
        if pairs.contains(&reverse) {
            relationship
                .metadata
                .insert("bidirectional".to_string(), "true".to_string());
            marked += 1;
        }
    }
    marked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Class, Relationship, RelationshipKind};

    const SMALL: &str = "openapi: 3.0.3\ninfo: {title: Small, version: '1'}\ncomponents:\n  schemas:\n    Pet:\n      properties:\n        owner: {$ref: '#/components/schemas/Owner'}\n    Owner:\n      properties:\n        pets:\n          type: array\n          items: {$ref: '#/components/schemas/Pet'}\n";

    #[test]
    fn test_orchestrator_creation() {
        let orchestrator = Orchestrator::new();
        assert!(orchestrator.get_detectors().is_empty());
        assert!(orchestrator.config_errors().is_empty());
    }

    #[test]
    fn test_default_plugins_detect_openapi() {
        let orchestrator = Orchestrator::with_default_plugins();
        assert_eq!(orchestrator.get_detectors(), vec!["openapi".to_string()]);
        assert_eq!(orchestrator.detect_document_type(SMALL).unwrap(), "openapi");
        assert!(orchestrator.detect_document_type("graph TD\nA-->B").is_err());
    }

    #[test]
    fn test_process_without_detectors_fails() {
        assert!(Orchestrator::new().process(SMALL).is_err());
    }

    #[test]
    fn test_process_renders_mermaid() {
        let output = Orchestrator::with_default_plugins().process(SMALL).unwrap();
        assert!(output.starts_with("classDiagram\n"));
        assert!(output.contains("  class Pet {"));
        assert!(output.contains("  class Owner {"));
        assert!(output.contains("Pet *-- Owner : owner"));
    }

    #[test]
    fn test_process_renders_json() {
        let mut config = Config::default();
        config.output.format = OutputFormat::Json;
        let output = Orchestrator::with_default_plugins()
            .with_config(config)
            .process(SMALL)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert!(value["classes"].as_array().is_some_and(|c| !c.is_empty()));
    }

    #[test]
    fn test_invalid_config_falls_back() {
        let mut config = Config::default();
        config.general.max_depth = 0;
        let orchestrator = Orchestrator::new().with_config(config);
        assert_eq!(
            orchestrator.config_errors(),
            &["general.maxDepth must be at least 1".to_string()]
        );
        assert_eq!(orchestrator.config().general.max_depth, Config::default().general.max_depth);
    }

    #[test]
    fn test_mark_bidirectional() {
        let mut diagram = ClassDiagram::new();
        diagram.add_class(Class::new("A", "A"));
        diagram.add_class(Class::new("B", "B"));
        diagram.add_relationship(Relationship::new("A", "B", RelationshipKind::Association));
        diagram.add_relationship(Relationship::new("B", "A", RelationshipKind::Composition));
        diagram.add_relationship(Relationship::new("A", "A", RelationshipKind::Dependency));
        diagram.add_relationship(
            Relationship::new("B", "A", RelationshipKind::Aggregation).structural(),
        );

        assert_eq!(mark_bidirectional(&mut diagram), 2);
        let flags: Vec<bool> = diagram
            .relationships()
            .iter()
            .map(|r| r.metadata.get("bidirectional").is_some())
            .collect();
        assert_eq!(flags, vec![true, true, false, false]);
    }

    #[test]
    fn test_build_diagram_marks_cycle_bidirectional() {
        let orchestrator = Orchestrator::with_default_plugins();
        let document = orchestrator.parse(SMALL).unwrap();
        let diagram = orchestrator.build_diagram(&document);
        let edge = diagram
            .relationships()
            .iter()
            .find(|r| r.source == "Pet" && r.target == "Owner")
            .unwrap();
        assert_eq!(edge.metadata.get("bidirectional").map(String::as_str), Some("true"));
    }

    #[test]
    fn test_cancelled_pipeline_still_renders() {
        let token = CancellationToken::new();
        token.cancel();
        let output = Orchestrator::with_default_plugins()
            .with_cancellation(token)
            .process(SMALL)
            .unwrap();
        assert_eq!(output, "classDiagram\n");
    }
}
