//! Renderer trait
//!
//! Renderers turn a populated database into output text. They never mutate
//! the database.

use anyhow::Result;

use super::Database;

/// Core trait for diagram renderers
pub trait Renderer<D: Database> {
    /// Rendered output type
    type Output;

    /// Render the database
    fn render(&self, database: &D) -> Result<Self::Output>;

    /// Renderer name
    fn name(&self) -> &'static str;

    /// Renderer version
    fn version(&self) -> &'static str;

    /// Output format name (`mermaid`, `json`, ...)
    fn format(&self) -> &'static str;
}
