//! Core abstractions for document processing
//!
//! The traits here split the pipeline into detection, parsing, diagram
//! storage and rendering. Shared infrastructure (errors, logging,
//! configuration, caching, cancellation) lives alongside them.

mod cache;
mod cancel;
pub mod config;
mod database;
mod detector;
mod error;
pub mod logging;
mod parser;
mod renderer;

pub use cache::*;
pub use cancel::*;
pub use config::*;
pub use database::*;
pub use detector::*;
pub use error::*;
pub use logging::*;
pub use parser::*;
pub use renderer::*;
