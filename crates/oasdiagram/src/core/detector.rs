//! Input detection
//!
//! Detectors look at raw text and decide whether a parser can make sense of
//! it, before any expensive parsing happens.

/// Core trait for input detectors
pub trait Detector: Send + Sync {
    /// Whether the input is recognised
    fn detect(&self, input: &str) -> bool;

    /// Confidence in `0.0..=1.0` that the input is recognised
    fn confidence(&self, input: &str) -> f64;

    /// Short name of the detected document type
    fn document_type(&self) -> &'static str;

    /// Markers the detector looks for
    fn patterns(&self) -> Vec<&'static str>;
}
