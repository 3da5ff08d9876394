//! JSON renderer: the diagram model as pretty-printed JSON

use anyhow::Result;
use tracing::debug;

use crate::core::{DiagramError, Renderer};
use crate::model::ClassDiagram;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl JsonRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer<ClassDiagram> for JsonRenderer {
    type Output = String;

    fn render(&self, diagram: &ClassDiagram) -> Result<String> {
        let output = serde_json::to_string_pretty(diagram)
            .map_err(|e| DiagramError::render_error(e.to_string()))?;
        debug!(output_len = output.len(), "JSON rendering completed");
        Ok(output)
    }

    fn name(&self) -> &'static str {
        "json"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn format(&self) -> &'static str {
        "json"
    }
}
