//! Evidence files for a run: per-platform CSVs, the JSON report and the
//! composed social post, all under `<root>/evidence_<YYYY-MM-DD>/`.
//!
//! Any failure here is a [`SentimentError::Persistence`] and ends the run.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregate::build_report;
use crate::compose::compose_social_post;
use crate::error::SentimentError;
use crate::platform::Platform;
use crate::types::{AnalysisMode, Report, RunContext, SentimentRecord};

#[derive(Serialize)]
struct SingleModeRow<'a> {
    timestamp: String,
    platform: &'a str,
    source_url: &'a str,
    text_preview: &'a str,
    sentiment: &'a str,
    confidence: f64,
    ai_reasoning: &'a str,
}

#[derive(Serialize)]
struct BatchModeRow<'a> {
    timestamp: String,
    platform: &'a str,
    source_url: &'a str,
    text_preview: &'a str,
    sentiment: &'a str,
    intensity: &'a str,
    confidence: f64,
    emotional_indicators: String,
    reasoning: &'a str,
}

/// Everything written by [`persist_run`].
#[derive(Debug, Clone)]
pub struct PersistedRun {
    pub csv_paths: Vec<PathBuf>,
    pub social_post_path: PathBuf,
    pub report_path: PathBuf,
    pub report: Report,
    pub social_post: String,
}

/// Writes files into one run's evidence directory.
#[derive(Debug)]
pub struct EvidenceWriter {
    dir: PathBuf,
    timestamp: String,
}

impl EvidenceWriter {
    /// Create the evidence directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Persistence`] if the directory cannot be created.
    pub fn prepare(ctx: &RunContext) -> Result<Self, SentimentError> {
        fs::create_dir_all(&ctx.evidence_dir)
            .map_err(|e| SentimentError::persistence(&ctx.evidence_dir, e))?;
        Ok(Self {
            dir: ctx.evidence_dir.clone(),
            timestamp: ctx.timestamp.clone(),
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the records of `platform` to `<platform>_analysis_<timestamp>.csv`.
    /// Returns `None` without creating a file when there are no such records.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Persistence`] on any I/O or CSV failure.
    pub fn write_records(
        &self,
        platform: Platform,
        records: &[SentimentRecord],
        mode: AnalysisMode,
    ) -> Result<Option<PathBuf>, SentimentError> {
        let rows: Vec<&SentimentRecord> =
            records.iter().filter(|r| r.platform == platform).collect();
        if rows.is_empty() {
            return Ok(None);
        }

        let path = self
            .dir
            .join(format!("{platform}_analysis_{}.csv", self.timestamp));
        let mut writer =
            csv::Writer::from_path(&path).map_err(|e| SentimentError::persistence(&path, e))?;

        for record in &rows {
            let timestamp = record.timestamp.to_rfc3339();
            let result = match mode {
                AnalysisMode::Single => writer.serialize(SingleModeRow {
                    timestamp,
                    platform: record.platform.as_str(),
                    source_url: &record.source_url,
                    text_preview: &record.text_preview,
                    sentiment: record.sentiment.as_str(),
                    confidence: record.confidence,
                    ai_reasoning: &record.reasoning,
                }),
                AnalysisMode::Batch => writer.serialize(BatchModeRow {
                    timestamp,
                    platform: record.platform.as_str(),
                    source_url: &record.source_url,
                    text_preview: &record.text_preview,
                    sentiment: record.sentiment.as_str(),
                    intensity: record.intensity.map_or("", |i| i.as_str()),
                    confidence: record.confidence,
                    emotional_indicators: serde_json::to_string(&record.emotional_indicators)
                        .map_err(|e| SentimentError::persistence(&path, e))?,
                    reasoning: &record.reasoning,
                }),
            };
            result.map_err(|e| SentimentError::persistence(&path, e))?;
        }
        writer
            .flush()
            .map_err(|e| SentimentError::persistence(&path, e))?;

        tracing::info!(
            platform = %platform,
            rows = rows.len(),
            path = %path.display(),
            "wrote evidence csv"
        );
        Ok(Some(path))
    }

    /// Write `report` as pretty JSON to `daily_report_<timestamp>.json`.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Persistence`] on serialization or I/O failure.
    pub fn write_report(&self, report: &Report) -> Result<PathBuf, SentimentError> {
        let path = self.report_path();
        let json = serde_json::to_string_pretty(report)
            .map_err(|e| SentimentError::persistence(&path, e))?;
        fs::write(&path, json).map_err(|e| SentimentError::persistence(&path, e))?;
        tracing::info!(path = %path.display(), "wrote report");
        Ok(path)
    }

    /// Write the composed post to `social_post_<timestamp>.txt`.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Persistence`] on I/O failure.
    pub fn write_social_post(&self, text: &str) -> Result<PathBuf, SentimentError> {
        let path = self
            .dir
            .join(format!("social_post_{}.txt", self.timestamp));
        fs::write(&path, text).map_err(|e| SentimentError::persistence(&path, e))?;
        Ok(path)
    }

    fn report_path(&self) -> PathBuf {
        self.dir
            .join(format!("daily_report_{}.json", self.timestamp))
    }
}

/// Write every evidence file for a finished run and return the final report.
///
/// CSVs come first so the report's `evidence_file_paths` can list them along
/// with the social post and the report itself.
///
/// # Errors
///
/// Returns [`SentimentError::Persistence`] if any file cannot be written.
pub fn persist_run(
    ctx: &RunContext,
    records: &[SentimentRecord],
    mode: AnalysisMode,
    generated_at: DateTime<Utc>,
) -> Result<PersistedRun, SentimentError> {
    let writer = EvidenceWriter::prepare(ctx)?;

    let mut csv_paths = Vec::new();
    for platform in Platform::ALL {
        if let Some(path) = writer.write_records(platform, records, mode)? {
            csv_paths.push(path);
        }
    }

    let mut report = build_report(ctx, records, generated_at);
    let social_post = compose_social_post(&report);
    let social_post_path = writer.write_social_post(&social_post)?;
    let report_path = writer.report_path();

    report.evidence_file_paths = csv_paths
        .iter()
        .chain([&social_post_path, &report_path])
        .map(|p| p.display().to_string())
        .collect();
    writer.write_report(&report)?;

    Ok(PersistedRun {
        csv_paths,
        social_post_path,
        report_path,
        report,
        social_post,
    })
}
