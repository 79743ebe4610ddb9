use std::sync::LazyLock;

use regex::Regex;

use super::{clamp_confidence, DEFAULT_CONFIDENCE};
use crate::types::Sentiment;

const MAX_REASONING_CHARS: usize = 200;
const DEFAULT_REASONING: &str = "Unable to parse response";

static SENTIMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Sentiment:\s*(\w+)").expect("valid sentiment regex"));
static CONFIDENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Confidence:\s*(-?[0-9]*\.?[0-9]+)").expect("valid confidence regex")
});
static REASONING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)Reasoning:\s*(.+)").expect("valid reasoning regex"));

/// Fields recovered from a single-text reply.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleTextAnalysis {
    pub sentiment: Sentiment,
    pub confidence: f64,
    pub reasoning: String,
}

impl Default for SingleTextAnalysis {
    fn default() -> Self {
        Self {
            sentiment: Sentiment::Neutral,
            confidence: DEFAULT_CONFIDENCE,
            reasoning: DEFAULT_REASONING.to_string(),
        }
    }
}

/// Strategy for reading a single-text reply. Must not fail: missing fields
/// come back as the neutral defaults.
pub trait SingleTextParser: Send + Sync {
    fn parse(&self, response: &str) -> SingleTextAnalysis;
}

/// Matches `Sentiment:`, `Confidence:` and `Reasoning:` lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelledLineParser;

impl SingleTextParser for LabelledLineParser {
    fn parse(&self, response: &str) -> SingleTextAnalysis {
        let mut analysis = SingleTextAnalysis::default();

        if let Some(caps) = SENTIMENT_RE.captures(response) {
            analysis.sentiment = Sentiment::from_label(&caps[1]);
        }

        if let Some(value) = CONFIDENCE_RE
            .captures(response)
            .and_then(|caps| caps[1].parse::<f64>().ok())
        {
            analysis.confidence = clamp_confidence(value);
        }

        if let Some(caps) = REASONING_RE.captures(response) {
            let reasoning: String = caps[1].trim().chars().take(MAX_REASONING_CHARS).collect();
            if !reasoning.is_empty() {
                analysis.reasoning = reasoning;
            }
        }

        analysis
    }
}
