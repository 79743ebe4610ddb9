//! Turning backend replies into structured sentiment.
//!
//! Single-text replies are free text and go through a [`SingleTextParser`]
//! strategy so the labelled-line matcher can be swapped out. Batch replies
//! are JSON and are parsed by [`parse_batch_response`].

mod batch;
mod single;

pub use batch::{parse_batch_response, BatchEntry, ParsedBatch};
pub use single::{LabelledLineParser, SingleTextAnalysis, SingleTextParser};

/// Default confidence when the backend's value is missing or unusable.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Clamp to `[0.0, 1.0]`; NaN and infinities fall back to the default.
#[must_use]
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        DEFAULT_CONFIDENCE
    }
}
