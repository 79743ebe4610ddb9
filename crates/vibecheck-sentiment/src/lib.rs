//! Social sentiment pipeline for vibecheck.
//!
//! Takes Reddit and X URLs, extracts comment and reply text through a
//! [`TextSource`], asks a [`ReasoningBackend`] to label each text (one at a
//! time or in JSON batches), aggregates the labels into a [`Report`], and
//! writes CSV, JSON and plain-text evidence for the run.

pub mod aggregate;
pub mod compose;
pub mod error;
pub mod evidence;
pub mod extract;
pub mod parse;
pub mod pipeline;
pub mod platform;
pub mod prompt;
pub mod reasoning;
pub mod sources;
pub mod throttle;
pub mod types;

pub use error::SentimentError;
pub use evidence::{persist_run, EvidenceWriter, PersistedRun};
pub use extract::{TextExtractor, TextSource};
pub use pipeline::{CancelFlag, Pipeline, PipelineOutcome};
pub use platform::{detect_platform, Platform};
pub use reasoning::{ChatCompletionsClient, ReasoningBackend};
pub use sources::{CommandSource, PlatformRouter, RedditThreadSource};
pub use types::{
    AnalysisMode, PipelineConfig, Report, RunContext, RunSummary, Sentiment, SentimentRecord,
    SentimentStats, TextUnit,
};
