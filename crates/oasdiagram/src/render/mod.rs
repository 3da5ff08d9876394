//! Diagram renderers
//!
//! Both renderers read a finished [`ClassDiagram`](crate::model::ClassDiagram)
//! and never change it.

mod json;
mod mermaid;

pub use json::*;
pub use mermaid::*;
