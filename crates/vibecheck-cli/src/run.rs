//! Command handlers: URL intake, pipeline wiring and result printing.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use vibecheck_core::{AppConfig, ConfigError};
use vibecheck_sentiment::{
    detect_platform, AnalysisMode, CancelFlag, ChatCompletionsClient, CommandSource, Pipeline,
    PipelineConfig, Platform, PlatformRouter, RedditThreadSource, RunContext, TextSource,
};

/// What one `analyze` or `daily` invocation should do.
#[derive(Debug)]
pub(crate) struct RunPlan {
    pub urls: Vec<String>,
    pub mode: AnalysisMode,
    pub batch_size: Option<usize>,
    pub dry_run: bool,
}

/// Trending seeds for every platform, in platform order.
pub(crate) fn seed_urls() -> Vec<String> {
    Platform::ALL
        .iter()
        .flat_map(|p| p.trending_seed_urls().iter().map(ToString::to_string))
        .collect()
}

/// Lines of a URL list with blanks and `#` comments removed.
pub(crate) fn parse_url_lines(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToString::to_string)
        .collect()
}

/// Merge positional URLs with the optional URL file. Falls back to reading
/// URLs interactively from stdin (until an empty line) when both are empty.
///
/// # Errors
///
/// Returns an error if the URL file or stdin cannot be read, or if no URLs
/// were provided at all.
pub(crate) async fn collect_urls(
    mut urls: Vec<String>,
    file: Option<&Path>,
) -> anyhow::Result<Vec<String>> {
    if let Some(path) = file {
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading URL file {}", path.display()))?;
        urls.extend(parse_url_lines(&contents));
    }

    if urls.is_empty() {
        println!("Enter Reddit or X URLs, one per line (empty line to finish):");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await.context("reading URLs from stdin")? {
            let line = line.trim();
            if line.is_empty() {
                break;
            }
            urls.push(line.to_string());
        }
    }

    if urls.is_empty() {
        anyhow::bail!("no URLs provided");
    }
    Ok(urls)
}

pub(crate) fn pipeline_config(config: &AppConfig, plan: &RunPlan) -> PipelineConfig {
    PipelineConfig {
        mode: plan.mode,
        batch_size: plan.batch_size.unwrap_or(config.batch_size),
        min_text_chars: config.min_text_chars,
        max_texts_per_url: config.max_texts_per_url,
        inference_delay: Duration::from_millis(config.inference_delay_ms),
        inference_jitter: Duration::from_millis(config.inference_jitter_ms),
        inference_max_retries: config.inference_max_retries,
        inference_backoff_base_ms: config.inference_backoff_base_ms,
    }
}

/// Reddit goes through the public JSON view; X needs the external scraper.
fn build_source(config: &AppConfig) -> anyhow::Result<Box<dyn TextSource>> {
    let reddit = RedditThreadSource::new(config.request_timeout_secs, &config.user_agent)?;
    let mut router = PlatformRouter::new().route(Platform::Reddit, Box::new(reddit));

    match config
        .scraper_command
        .as_deref()
        .and_then(|parts| {
            CommandSource::from_command_line(parts, Duration::from_secs(config.request_timeout_secs))
        }) {
        Some(scraper) => router = router.route(Platform::X, Box::new(scraper)),
        None => tracing::warn!("VIBECHECK_SCRAPER_COMMAND is not set; X URLs will be skipped"),
    }

    Ok(Box::new(router))
}

fn print_plan(config: &AppConfig, plan: &RunPlan, pipeline_config: &PipelineConfig) {
    println!(
        "dry-run: {} URLs, mode {:?}, batch size {}, evidence under {}",
        plan.urls.len(),
        plan.mode,
        pipeline_config.batch_size,
        config.evidence_root.display()
    );
    for url in &plan.urls {
        match detect_platform(url) {
            Ok(platform) => println!("  {:<6} {url}", platform.as_str()),
            Err(e) => println!("  skip   {url} ({e})"),
        }
    }
}

/// Run the pipeline for `plan`, or just print it when `plan.dry_run` is set.
///
/// # Errors
///
/// Returns an error if the API key is missing, a client cannot be built, or
/// evidence cannot be written. Per-URL failures are logged and skipped.
pub(crate) async fn execute(config: &AppConfig, plan: RunPlan) -> anyhow::Result<()> {
    let pipeline_config = pipeline_config(config, &plan);

    if plan.dry_run {
        print_plan(config, &plan, &pipeline_config);
        return Ok(());
    }

    let api_key = config
        .reasoning_api_key
        .as_deref()
        .ok_or_else(|| ConfigError::MissingEnvVar("REASONING_API_KEY".to_string()))?;
    let backend = ChatCompletionsClient::new(
        &config.reasoning_api_url,
        api_key,
        &config.reasoning_model,
        config.request_timeout_secs,
    )?;
    let source = build_source(config)?;
    let pipeline = Pipeline::new(source, Box::new(backend), pipeline_config);

    let cancel = CancelFlag::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing current URL then saving results");
            on_interrupt.cancel();
        }
    });

    let ctx = RunContext::new(&config.evidence_root, Utc::now());
    let outcome = pipeline.run(&ctx, &plan.urls, &cancel).await?;

    let summary = &outcome.summary;
    println!(
        "analyzed {} texts from {}/{} URLs ({} skipped, {} inference failures){}",
        summary.records_collected,
        summary.urls_processed,
        summary.urls_total,
        summary.urls_skipped,
        summary.inference_failures,
        if summary.cancelled { ", cancelled" } else { "" }
    );
    println!("evidence written to {}", ctx.evidence_dir.display());
    for path in &outcome.report().evidence_file_paths {
        println!("  {path}");
    }
    println!();
    println!("{}", outcome.persisted.social_post);

    Ok(())
}
