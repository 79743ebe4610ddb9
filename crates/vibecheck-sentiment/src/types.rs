use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::platform::Platform;

/// Maximum characters of source text kept on a record and in evidence rows.
pub const TEXT_PREVIEW_CHARS: usize = 500;

/// Sentiment label reported by the reasoning backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// Parse a backend label, case-insensitively. Unknown labels are `Neutral`.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Low,
    Medium,
    High,
}

impl Intensity {
    /// Parse a backend label, case-insensitively. Unknown labels yield `None`.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Intensity::Low),
            "medium" => Some(Intensity::Medium),
            "high" => Some(Intensity::High),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Intensity::Low => "low",
            Intensity::Medium => "medium",
            Intensity::High => "high",
        }
    }
}

/// How texts are sent to the reasoning backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// One backend call per text, labelled-line reply.
    Single,
    /// One backend call per batch, JSON reply.
    Batch,
}

/// One discrete piece of scraped content.
#[derive(Debug, Clone, PartialEq)]
pub struct TextUnit {
    pub platform: Platform,
    pub source_url: String,
    pub text: String,
    pub collected_at: DateTime<Utc>,
}

/// The per-text output of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentRecord {
    pub timestamp: DateTime<Utc>,
    pub platform: Platform,
    pub source_url: String,
    pub text_preview: String,
    pub sentiment: Sentiment,
    pub intensity: Option<Intensity>,
    /// Always within `[0.0, 1.0]`.
    pub confidence: f64,
    pub emotional_indicators: Vec<String>,
    pub reasoning: String,
    /// Key topics the backend reported for the batch this record came from.
    pub topics: Vec<String>,
}

impl SentimentRecord {
    /// Start a record for `unit` with the neutral defaults.
    #[must_use]
    pub fn neutral_for(unit: &TextUnit, reasoning: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            platform: unit.platform,
            source_url: unit.source_url.clone(),
            text_preview: preview(&unit.text, TEXT_PREVIEW_CHARS),
            sentiment: Sentiment::Neutral,
            intensity: None,
            confidence: 0.5,
            emotional_indicators: Vec::new(),
            reasoning: reasoning.into(),
            topics: Vec::new(),
        }
    }
}

/// Aggregate the backend reports alongside a batch. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub positive_pct: f64,
    pub negative_pct: f64,
    pub neutral_pct: f64,
    pub dominant_emotions: Vec<String>,
    pub key_topics: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentStats {
    pub positive_pct: f64,
    pub negative_pct: f64,
    pub neutral_pct: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingTopic {
    pub topic: String,
    pub mention_count: usize,
    pub dominant_sentiment: Sentiment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotTake {
    pub platform: Platform,
    pub source_url: String,
    pub text_preview: String,
    pub sentiment: Sentiment,
    pub intensity: Option<Intensity>,
    pub confidence: f64,
}

/// End-of-run report. Field order is the serialized key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub report_date: String,
    pub generated_at: DateTime<Utc>,
    pub total_analyzed: usize,
    pub per_platform_stats: BTreeMap<Platform, SentimentStats>,
    pub overall_stats: SentimentStats,
    pub trending_topics: Vec<TrendingTopic>,
    pub hot_takes: Vec<HotTake>,
    pub evidence_file_paths: Vec<String>,
}

/// Identity of one pipeline run, threaded through every stage.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// `YYYY-MM-DD`
    pub report_date: String,
    /// `YYYYMMDD_HHMMSS`, used to namespace evidence files.
    pub timestamp: String,
    pub evidence_dir: PathBuf,
}

impl RunContext {
    #[must_use]
    pub fn new(evidence_root: &Path, started_at: DateTime<Utc>) -> Self {
        let report_date = started_at.format("%Y-%m-%d").to_string();
        let timestamp = started_at.format("%Y%m%d_%H%M%S").to_string();
        let evidence_dir = evidence_root.join(format!("evidence_{report_date}"));
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            report_date,
            timestamp,
            evidence_dir,
        }
    }
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub urls_total: usize,
    pub urls_processed: usize,
    pub urls_skipped: usize,
    pub texts_extracted: usize,
    pub records_collected: usize,
    pub inference_failures: usize,
    pub cancelled: bool,
}

/// Tunables for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub mode: AnalysisMode,
    pub batch_size: usize,
    pub min_text_chars: usize,
    /// `0` disables the cap.
    pub max_texts_per_url: usize,
    pub inference_delay: Duration,
    pub inference_jitter: Duration,
    pub inference_max_retries: u32,
    pub inference_backoff_base_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: AnalysisMode::Single,
            batch_size: 10,
            min_text_chars: 10,
            max_texts_per_url: 50,
            inference_delay: Duration::from_millis(2000),
            inference_jitter: Duration::from_millis(1000),
            inference_max_retries: 1,
            inference_backoff_base_ms: 2000,
        }
    }
}

/// First `max_chars` characters of `text`.
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Like [`preview`], but marks truncation with a trailing `...`.
pub(crate) fn preview_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", preview(text, max_chars))
    } else {
        text.to_string()
    }
}
