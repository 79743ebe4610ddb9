//! Shareable text summary of a report.

use crate::types::Report;

const TOP_TOPICS: usize = 3;

/// Render the daily post. Generation only; nothing is published.
#[must_use]
pub fn compose_social_post(report: &Report) -> String {
    let overall = &report.overall_stats;

    let topics = if report.trending_topics.is_empty() {
        "No topics reported today\n".to_string()
    } else {
        report
            .trending_topics
            .iter()
            .take(TOP_TOPICS)
            .map(|t| format!("\u{2022} {}: {} sentiment\n", t.topic, t.dominant_sentiment))
            .collect()
    };

    format!(
        "Daily Internet Vibe Check - {date}\n\n\
         Overall sentiment:\n\
         Positive: {pos:.1}%\n\
         Negative: {neg:.1}%\n\
         Neutral: {neu:.1}%\n\n\
         Trending topics:\n\
         {topics}\n\
         Analyzed {total} posts across Reddit and X",
        date = report.report_date,
        pos = overall.positive_pct,
        neg = overall.negative_pct,
        neu = overall.neutral_pct,
        total = report.total_analyzed,
    )
}
