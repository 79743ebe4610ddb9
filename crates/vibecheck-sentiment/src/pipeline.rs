//! Sentiment pipeline orchestration.
//!
//! Each URL moves through detection, extraction, inference and parsing in
//! strict sequence. Per-URL and per-text failures are logged and absorbed;
//! only evidence persistence can fail a run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;

use crate::error::SentimentError;
use crate::evidence::{persist_run, PersistedRun};
use crate::extract::{TextExtractor, TextSource};
use crate::parse::{parse_batch_response, LabelledLineParser, SingleTextParser};
use crate::platform::detect_platform;
use crate::prompt::{batch_prompt, single_text_prompt};
use crate::reasoning::ReasoningBackend;
use crate::throttle::{infer_with_retry, InferenceThrottle};
use crate::types::{
    AnalysisMode, PipelineConfig, Report, RunContext, RunSummary, SentimentRecord, TextUnit,
};

/// Cooperative cancellation shared between the pipeline and a signal handler.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub summary: RunSummary,
    pub persisted: PersistedRun,
}

impl PipelineOutcome {
    #[must_use]
    pub fn report(&self) -> &Report {
        &self.persisted.report
    }
}

pub struct Pipeline {
    source: Box<dyn TextSource>,
    backend: Box<dyn ReasoningBackend>,
    parser: Box<dyn SingleTextParser>,
    extractor: TextExtractor,
    throttle: InferenceThrottle,
    config: PipelineConfig,
}

impl Pipeline {
    /// Build a pipeline around an already-acquired source. The source is
    /// released at the end of [`Pipeline::run`].
    #[must_use]
    pub fn new(
        source: Box<dyn TextSource>,
        backend: Box<dyn ReasoningBackend>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            backend,
            parser: Box::new(LabelledLineParser),
            extractor: TextExtractor::new(config.min_text_chars, config.max_texts_per_url),
            throttle: InferenceThrottle::new(config.inference_delay, config.inference_jitter),
            config,
        }
    }

    /// Swap the single-text reply parser.
    #[must_use]
    pub fn with_parser(mut self, parser: Box<dyn SingleTextParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Analyze `urls` in order and persist the evidence for whatever was
    /// collected, including partial results after cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Persistence`] if evidence cannot be written.
    /// No other failure escapes.
    pub async fn run(
        &self,
        ctx: &RunContext,
        urls: &[String],
        cancel: &CancelFlag,
    ) -> Result<PipelineOutcome, SentimentError> {
        let mut summary = RunSummary {
            urls_total: urls.len(),
            ..RunSummary::default()
        };
        let mut records: Vec<SentimentRecord> = Vec::new();

        tracing::info!(
            run_id = %ctx.run_id,
            urls = urls.len(),
            mode = ?self.config.mode,
            source = self.source.name(),
            backend = self.backend.name(),
            "starting sentiment run"
        );

        for url in urls {
            if cancel.is_cancelled() {
                tracing::warn!(run_id = %ctx.run_id, "run cancelled, persisting partial results");
                summary.cancelled = true;
                break;
            }

            let platform = match detect_platform(url) {
                Ok(platform) => platform,
                Err(e) => {
                    tracing::warn!(url = %url, stage = "detect", error = %e, "skipping url");
                    summary.urls_skipped += 1;
                    continue;
                }
            };

            let units = self
                .extractor
                .extract(self.source.as_ref(), url, platform)
                .await;
            if units.is_empty() {
                tracing::warn!(url = %url, %platform, stage = "extract", "no texts extracted, skipping url");
                summary.urls_skipped += 1;
                continue;
            }
            summary.texts_extracted += units.len();

            let before = records.len();
            match self.config.mode {
                AnalysisMode::Single => {
                    self.analyze_single(&units, &mut records, &mut summary)
                        .await;
                }
                AnalysisMode::Batch => {
                    self.analyze_batches(&units, &mut records, &mut summary)
                        .await;
                }
            }
            summary.urls_processed += 1;

            tracing::info!(
                url = %url,
                %platform,
                texts = units.len(),
                records = records.len() - before,
                "url analyzed"
            );
        }

        self.source.release().await;
        summary.records_collected = records.len();

        let persisted = persist_run(ctx, &records, self.config.mode, Utc::now())?;

        tracing::info!(
            run_id = %ctx.run_id,
            urls_total = summary.urls_total,
            urls_processed = summary.urls_processed,
            urls_skipped = summary.urls_skipped,
            texts_extracted = summary.texts_extracted,
            records = summary.records_collected,
            inference_failures = summary.inference_failures,
            cancelled = summary.cancelled,
            evidence_dir = %ctx.evidence_dir.display(),
            "sentiment run complete"
        );

        Ok(PipelineOutcome { summary, persisted })
    }

    async fn infer(&self, prompt: &str) -> Result<String, SentimentError> {
        infer_with_retry(
            self.backend.as_ref(),
            &self.throttle,
            prompt,
            self.config.inference_max_retries,
            self.config.inference_backoff_base_ms,
        )
        .await
    }

    /// One call per text. A failed call still yields a neutral record.
    async fn analyze_single(
        &self,
        units: &[TextUnit],
        records: &mut Vec<SentimentRecord>,
        summary: &mut RunSummary,
    ) {
        for unit in units {
            let prompt = single_text_prompt(&unit.text);
            let record = match self.infer(&prompt).await {
                Ok(reply) => {
                    let analysis = self.parser.parse(&reply);
                    let mut record = SentimentRecord::neutral_for(unit, analysis.reasoning);
                    record.sentiment = analysis.sentiment;
                    record.confidence = analysis.confidence;
                    record
                }
                Err(e) => {
                    summary.inference_failures += 1;
                    tracing::warn!(
                        url = %unit.source_url,
                        stage = "infer",
                        error = %e,
                        "inference failed, recording neutral default"
                    );
                    SentimentRecord::neutral_for(unit, format!("Error: {e}"))
                }
            };
            records.push(record);
        }
    }

    /// One call per chunk of `batch_size`. A failed chunk yields nothing.
    async fn analyze_batches(
        &self,
        units: &[TextUnit],
        records: &mut Vec<SentimentRecord>,
        summary: &mut RunSummary,
    ) {
        for (batch_index, chunk) in units.chunks(self.config.batch_size.max(1)).enumerate() {
            let prompt = batch_prompt(chunk);
            let parsed = match self.infer(&prompt).await {
                Ok(reply) => parse_batch_response(&reply, chunk.len()),
                Err(e) => Err(e),
            };
            let parsed = match parsed {
                Ok(parsed) => parsed,
                Err(e) => {
                    summary.inference_failures += 1;
                    tracing::warn!(
                        url = %chunk[0].source_url,
                        batch_index,
                        batch_len = chunk.len(),
                        stage = "batch",
                        error = %e,
                        "batch failed, dropping its texts"
                    );
                    continue;
                }
            };

            if parsed.entries.len() < chunk.len() {
                tracing::warn!(
                    url = %chunk[0].source_url,
                    batch_index,
                    expected = chunk.len(),
                    got = parsed.entries.len(),
                    "backend omitted texts from batch reply"
                );
            }

            let topics = match parsed.summary {
                Some(backend_summary) => {
                    tracing::debug!(
                        batch_index,
                        positive_pct = backend_summary.positive_pct,
                        negative_pct = backend_summary.negative_pct,
                        neutral_pct = backend_summary.neutral_pct,
                        "backend batch summary"
                    );
                    backend_summary.key_topics
                }
                None => Vec::new(),
            };

            for entry in parsed.entries {
                let unit = &chunk[entry.text_id];
                let mut record = SentimentRecord::neutral_for(unit, entry.reasoning);
                record.sentiment = entry.sentiment;
                record.intensity = entry.intensity;
                record.confidence = entry.confidence;
                record.emotional_indicators = entry.emotional_indicators;
                record.topics.clone_from(&topics);
                records.push(record);
            }
        }
    }
}
