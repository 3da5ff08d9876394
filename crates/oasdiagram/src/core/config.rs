//! Diagram configuration
//!
//! Every field has a default, so a config file only needs the keys it wants
//! to change. Keys are camelCase in YAML and JSON.
//!
//! ```yaml
//! includeOperations: false
//! schema:
//!   maxProperties: 10
//!   enumVisualization: class
//! filter:
//!   excludeTags: [internal]
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::DiagramError;

/// How enum schemas are shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnumVisualization {
    /// Values listed in the property name
    #[default]
    Inline,
    /// A separate `<<enumeration>>` class
    Class,
    /// Only the value count
    Comment,
}

/// Output dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Mermaid,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mermaid" => Ok(OutputFormat::Mermaid),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

impl OutputFormat {
    pub fn variants() -> &'static [&'static str] {
        &["mermaid", "json"]
    }
}

/// Traversal limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneralConfig {
    /// Maximum reference-following depth (1..=200)
    pub max_depth: i64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { max_depth: 50 }
    }
}

/// How schemas turn into classes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchemaConfig {
    pub max_properties: i64,
    /// Nesting cap for inline object properties promoted to classes
    pub max_depth: i64,
    pub show_constraints: bool,
    pub show_enums: bool,
    pub show_discriminators: bool,
    pub show_format: bool,
    pub inherited_properties: bool,
    pub collapse_large_schemas: bool,
    pub large_schema_threshold: i64,
    pub enum_visualization: EnumVisualization,
    pub max_inline_enum_values: usize,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            max_properties: 20,
            max_depth: 10,
            show_constraints: true,
            show_enums: true,
            show_discriminators: true,
            show_format: true,
            inherited_properties: false,
            collapse_large_schemas: true,
            large_schema_threshold: 50,
            enum_visualization: EnumVisualization::Inline,
            max_inline_enum_values: 5,
        }
    }
}

/// Which relationships are detected and how
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RelationConfig {
    pub detect_polymorphism: bool,
    pub simplify_references: bool,
    pub show_cardinality: bool,
    pub analyze_property_types: bool,
    pub detect_bidirectional: bool,
    pub merge_duplicate_refs: bool,
}

impl Default for RelationConfig {
    fn default() -> Self {
        Self {
            detect_polymorphism: true,
            simplify_references: false,
            show_cardinality: true,
            analyze_property_types: true,
            detect_bidirectional: true,
            merge_duplicate_refs: false,
        }
    }
}

/// Operation and component filtering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterConfig {
    pub include_tags: Vec<String>,
    pub exclude_tags: Vec<String>,
    pub include_paths: Vec<String>,
    pub exclude_paths: Vec<String>,
    pub exclude_deprecated: bool,
    /// Class cap, 0 for unlimited
    pub max_complexity: i64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            include_tags: Vec::new(),
            exclude_tags: Vec::new(),
            include_paths: Vec::new(),
            exclude_paths: Vec::new(),
            exclude_deprecated: false,
            max_complexity: 1000,
        }
    }
}

impl FilterConfig {
    /// Whether an operation with these tags passes the tag filters
    pub fn allows_tags(&self, tags: &[String]) -> bool {
        if tags.iter().any(|t| self.exclude_tags.contains(t)) {
            return false;
        }
        self.include_tags.is_empty() || tags.iter().any(|t| self.include_tags.contains(t))
    }

    /// Whether a path passes the prefix filters
    pub fn allows_path(&self, path: &str) -> bool {
        if self.exclude_paths.iter().any(|p| path.starts_with(p.as_str())) {
            return false;
        }
        self.include_paths.is_empty() || self.include_paths.iter().any(|p| path.starts_with(p.as_str()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputConfig {
    pub format: OutputFormat,
}

/// Complete diagram configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub include_private: bool,
    pub include_operations: bool,
    pub show_cardinality: bool,
    pub use_namespaces: bool,
    pub simplify_names: bool,
    pub render_titled_inline_schema: bool,
    pub general: GeneralConfig,
    pub schema: SchemaConfig,
    pub relation: RelationConfig,
    pub filter: FilterConfig,
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include_private: true,
            include_operations: true,
            show_cardinality: true,
            use_namespaces: false,
            simplify_names: true,
            render_titled_inline_schema: true,
            general: GeneralConfig::default(),
            schema: SchemaConfig::default(),
            relation: RelationConfig::default(),
            filter: FilterConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Parse a YAML (or JSON) config document
    pub fn from_yaml_str(input: &str) -> Result<Self, DiagramError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(input)
            .map_err(|e| DiagramError::config_error(format!("invalid configuration: {}", e)))
    }

    /// Load a config file; `.json` files go through `serde_json`, everything
    /// else through the YAML parser
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DiagramError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            serde_json::from_str(&text).map_err(|e| {
                DiagramError::config_error(format!("{}: {}", path.display(), e))
            })
        } else {
            Self::from_yaml_str(&text)
        }
    }

    /// Validation errors, empty when the config is usable as is
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.general.max_depth < 1 {
            errors.push("general.maxDepth must be at least 1".to_string());
        }
        if self.general.max_depth > 200 {
            errors.push("general.maxDepth should not exceed 200 (risk of stack overflow)".to_string());
        }
        if self.schema.max_properties < 0 {
            errors.push("schema.maxProperties cannot be negative".to_string());
        }
        if self.schema.max_depth < 1 {
            errors.push("schema.maxDepth must be at least 1".to_string());
        }
        if self.schema.large_schema_threshold < 10 {
            errors.push("schema.largeSchemaThreshold should be at least 10".to_string());
        }
        if self.filter.max_complexity < 0 {
            errors.push("filter.maxComplexity cannot be negative".to_string());
        }
        for tag in self.conflicting_tags() {
            errors.push(format!(
                "filter.includeTags and filter.excludeTags contain same tag: {}",
                tag
            ));
        }

        errors
    }

    fn conflicting_tags(&self) -> Vec<String> {
        let include: HashSet<&String> = self.filter.include_tags.iter().collect();
        self.filter
            .exclude_tags
            .iter()
            .filter(|tag| include.contains(tag))
            .cloned()
            .collect()
    }

    /// A copy with every invalid field reset to its default, plus the errors
    ///
    /// Tags listed in both include and exclude filters are dropped from the
    /// exclude list.
    pub fn validated(&self) -> (Config, Vec<String>) {
        let errors = self.validate();
        if errors.is_empty() {
            return (self.clone(), errors);
        }

        let defaults = Config::default();
        let mut config = self.clone();
        if !(1..=200).contains(&config.general.max_depth) {
            config.general.max_depth = defaults.general.max_depth;
        }
        if config.schema.max_properties < 0 {
            config.schema.max_properties = defaults.schema.max_properties;
        }
        if config.schema.max_depth < 1 {
            config.schema.max_depth = defaults.schema.max_depth;
        }
        if config.schema.large_schema_threshold < 10 {
            config.schema.large_schema_threshold = defaults.schema.large_schema_threshold;
        }
        if config.filter.max_complexity < 0 {
            config.filter.max_complexity = defaults.filter.max_complexity;
        }
        let conflicts = self.conflicting_tags();
        config.filter.exclude_tags.retain(|t| !conflicts.contains(t));

        for error in &errors {
            warn!(error = error.as_str(), "Invalid configuration value replaced by default");
        }
        (config, errors)
    }

    /// Property cap per class, 0 when unlimited
    pub fn max_properties(&self) -> usize {
        usize::try_from(self.schema.max_properties).unwrap_or(0)
    }

    /// Class cap, `None` when unlimited
    pub fn max_complexity(&self) -> Option<usize> {
        match usize::try_from(self.filter.max_complexity) {
            Ok(0) | Err(_) => None,
            Ok(cap) => Some(cap),
        }
    }

    /// Nesting cap for inline property schemas
    pub fn schema_depth(&self) -> usize {
        usize::try_from(self.schema.max_depth).unwrap_or(1).max(1)
    }

    /// Reference-following cap
    pub fn general_depth(&self) -> usize {
        usize::try_from(self.general.max_depth).unwrap_or(1).clamp(1, 200)
    }

    /// Cardinality is shown only when both switches are on
    pub fn cardinality_enabled(&self) -> bool {
        self.show_cardinality && self.relation.show_cardinality
    }
}
