//! Language-independent class diagram model
//!
//! Classes and relationships in insertion order, with the deduplication rules
//! that keep the diagram free of repeated classes and edges.

mod class;
mod diagram;
mod relationship;

pub use class::*;
pub use diagram::*;
pub use relationship::*;
