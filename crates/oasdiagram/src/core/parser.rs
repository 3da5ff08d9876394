//! Parser trait
//!
//! Parsers turn raw text into a typed document that the builder can walk.

use anyhow::Result;

/// Core trait for input parsers
pub trait Parser: Send + Sync {
    /// The parsed document type
    type Output;

    /// Parse the input text
    fn parse(&self, input: &str) -> Result<Self::Output>;

    /// Parser name, for logging
    fn name(&self) -> &'static str;

    /// Parser version, for logging
    fn version(&self) -> &'static str;

    /// Quick check whether the input can be parsed at all
    fn can_parse(&self, input: &str) -> bool;
}
