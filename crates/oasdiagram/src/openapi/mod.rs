//! OpenAPI 3.x document model
//!
//! A serde model of the parts of an OpenAPI document the diagram builder
//! reads, plus JSON paths, `$ref` resolution and loading from JSON or YAML.

mod document;
mod loader;
mod path;
mod resolver;
mod schema;

pub use document::*;
pub use loader::*;
pub use path::*;
pub use resolver::*;
pub use schema::*;
