//! Loading OpenAPI documents from JSON or YAML text

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, span, trace, Level};

use super::document::OpenApi;
use crate::core::{DiagramError, Detector, Parser};

/// Source syntax of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Yaml,
}

impl SourceFormat {
    /// JSON documents start with `{`; everything else is treated as YAML
    pub fn sniff(input: &str) -> Self {
        if input.trim_start().starts_with('{') {
            SourceFormat::Json
        } else {
            SourceFormat::Yaml
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceFormat::Json => "json",
            SourceFormat::Yaml => "yaml",
        }
    }
}

/// Read the `openapi` version field, accepting YAML numbers such as `3.1`
fn version_of(value: &Value) -> Option<String> {
    match value.get("openapi")? {
        Value::String(version) => Some(version.clone()),
        Value::Number(version) => Some(version.to_string()),
        _ => None,
    }
}

/// Parse `input` into an [`OpenApi`] document, rejecting anything but 3.x
pub fn load_document(input: &str) -> Result<OpenApi, DiagramError> {
    let format = SourceFormat::sniff(input);
    let mut value: Value = match format {
        SourceFormat::Json => serde_json::from_str(input)?,
        SourceFormat::Yaml => serde_yaml::from_str(input)?,
    };

    let version = match version_of(&value) {
        Some(version) => version,
        None => {
            if let Some(swagger) = value.get("swagger") {
                let version = match swagger {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                return Err(DiagramError::unsupported_version(version));
            }
            return Err(DiagramError::parse_error(
                "missing `openapi` version field".to_string(),
                0,
                0,
            ));
        }
    };
    if !version.starts_with("3.") && version != "3" {
        return Err(DiagramError::unsupported_version(version));
    }
    trace!(version = version.as_str(), format = format.as_str(), "Document version accepted");

    if let Some(field) = value.get_mut("openapi") {
        *field = Value::String(version);
    }
    Ok(serde_json::from_value(value)?)
}

/// Parser for OpenAPI 3.x documents in JSON or YAML
#[derive(Debug, Default)]
pub struct DocumentParser;

impl DocumentParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for DocumentParser {
    type Output = OpenApi;

    fn parse(&self, input: &str) -> Result<OpenApi> {
        let parse_span = span!(Level::DEBUG, "parse_document", input_len = input.len());
        let _enter = parse_span.enter();

        let document = load_document(input)?;
        debug!(
            version = document.openapi.as_str(),
            paths = document.paths.len(),
            schemas = document.component_schemas().count(),
            "Parsed document"
        );
        Ok(document)
    }

    fn name(&self) -> &'static str {
        "openapi"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn can_parse(&self, input: &str) -> bool {
        DocumentDetector::new().detect(input)
    }
}

/// Detector for OpenAPI 3.x documents
#[derive(Debug, Default)]
pub struct DocumentDetector;

impl DocumentDetector {
    pub fn new() -> Self {
        Self
    }

    /// Version string declared by the `openapi` key, read without parsing
    /// the whole document
    pub fn declared_version(input: &str) -> Option<String> {
        input.lines().take(200).find_map(|line| {
            let line = line.trim().trim_start_matches('{').trim();
            let rest = line
                .strip_prefix("\"openapi\"")
                .or_else(|| line.strip_prefix("openapi"))?;
            let value = rest.trim_start().strip_prefix(':')?;
            let value = value
                .trim()
                .trim_end_matches(|c| c == ',' || c == '}')
                .trim()
                .trim_matches(|c| c == '"' || c == '\'');
            (!value.is_empty()).then(|| value.to_string())
        })
    }
}

impl Detector for DocumentDetector {
    fn detect(&self, input: &str) -> bool {
        self.confidence(input) > 0.5
    }

    fn confidence(&self, input: &str) -> f64 {
        if let Some(version) = Self::declared_version(input) {
            return if version.starts_with('3') { 1.0 } else { 0.4 };
        }

        let has_swagger = input.contains("swagger");
        let has_paths = input.contains("paths");
        let has_components = input.contains("components");

        if has_swagger {
            return 0.3;
        }
        if has_paths && has_components {
            return 0.5;
        }
        0.0
    }

    fn document_type(&self) -> &'static str {
        "openapi"
    }

    fn patterns(&self) -> Vec<&'static str> {
        vec!["openapi:", "\"openapi\""]
    }
}
