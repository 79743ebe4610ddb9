//! Statistics, trending topics and hot takes over a run's records.
//!
//! Everything here is recomputed from [`SentimentRecord`]s; the backend's own
//! batch summaries are never trusted for the numbers.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::platform::Platform;
use crate::types::{
    preview, HotTake, Intensity, Report, RunContext, Sentiment, SentimentRecord,
    SentimentStats, TrendingTopic,
};

/// Records must be strictly above this confidence to count as a hot take.
pub const HOT_TAKE_CONFIDENCE: f64 = 0.8;
pub const MAX_HOT_TAKES: usize = 5;
pub const HOT_TAKE_PREVIEW_CHARS: usize = 100;

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[allow(clippy::cast_precision_loss)]
fn percent(part: usize, total: usize) -> f64 {
    round_one_decimal(part as f64 / total as f64 * 100.0)
}

/// Sentiment distribution of `records`, percentages rounded to one decimal.
#[must_use]
pub fn compute_stats<'a, I>(records: I) -> SentimentStats
where
    I: IntoIterator<Item = &'a SentimentRecord>,
{
    let mut count = 0;
    let mut positive = 0;
    let mut negative = 0;
    for record in records {
        count += 1;
        match record.sentiment {
            Sentiment::Positive => positive += 1,
            Sentiment::Negative => negative += 1,
            Sentiment::Neutral => {}
        }
    }

    if count == 0 {
        return SentimentStats::default();
    }

    // Each label rounds on its own; the sum may drift from 100 by 0.1.
    SentimentStats {
        positive_pct: percent(positive, count),
        negative_pct: percent(negative, count),
        neutral_pct: percent(count - positive - negative, count),
        count,
    }
}

struct TopicTally {
    topic: String,
    mentions: usize,
    positive: usize,
    negative: usize,
    neutral: usize,
}

impl TopicTally {
    fn dominant(&self) -> Sentiment {
        // Ties resolve positive, then negative, then neutral.
        if self.positive >= self.negative && self.positive >= self.neutral {
            Sentiment::Positive
        } else if self.negative >= self.neutral {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}

/// Topics reported for the records, most mentioned first.
///
/// Topics match case-insensitively and keep the first spelling seen. A
/// record mentioning the same topic twice counts once.
#[must_use]
pub fn extract_trending_topics(records: &[SentimentRecord]) -> Vec<TrendingTopic> {
    let mut order: Vec<TopicTally> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let mut seen_here = HashSet::new();
        for topic in &record.topics {
            let trimmed = topic.trim();
            if trimmed.is_empty() {
                continue;
            }
            let key = trimmed.to_lowercase();
            if !seen_here.insert(key.clone()) {
                continue;
            }
            let slot = *index.entry(key).or_insert_with(|| {
                order.push(TopicTally {
                    topic: trimmed.to_string(),
                    mentions: 0,
                    positive: 0,
                    negative: 0,
                    neutral: 0,
                });
                order.len() - 1
            });
            let tally = &mut order[slot];
            tally.mentions += 1;
            match record.sentiment {
                Sentiment::Positive => tally.positive += 1,
                Sentiment::Negative => tally.negative += 1,
                Sentiment::Neutral => tally.neutral += 1,
            }
        }
    }

    // Stable sort keeps first-seen order among equal counts.
    order.sort_by(|a, b| b.mentions.cmp(&a.mentions));
    order
        .into_iter()
        .map(|tally| TrendingTopic {
            dominant_sentiment: tally.dominant(),
            mention_count: tally.mentions,
            topic: tally.topic,
        })
        .collect()
}

/// High-confidence, high-intensity records, in input order, at most
/// [`MAX_HOT_TAKES`]. Previews are cut to [`HOT_TAKE_PREVIEW_CHARS`] and
/// always end in `...`.
#[must_use]
pub fn identify_hot_takes(records: &[SentimentRecord]) -> Vec<HotTake> {
    records
        .iter()
        .filter(|r| r.confidence > HOT_TAKE_CONFIDENCE && r.intensity == Some(Intensity::High))
        .take(MAX_HOT_TAKES)
        .map(|r| HotTake {
            platform: r.platform,
            source_url: r.source_url.clone(),
            text_preview: format!("{}...", preview(&r.text_preview, HOT_TAKE_PREVIEW_CHARS)),
            sentiment: r.sentiment,
            intensity: r.intensity,
            confidence: r.confidence,
        })
        .collect()
}

/// Assemble the run report. `evidence_file_paths` is left empty for the
/// evidence writer to fill.
#[must_use]
pub fn build_report(
    ctx: &RunContext,
    records: &[SentimentRecord],
    generated_at: DateTime<Utc>,
) -> Report {
    let per_platform_stats: BTreeMap<Platform, SentimentStats> = Platform::ALL
        .iter()
        .map(|platform| {
            let stats = compute_stats(records.iter().filter(|r| r.platform == *platform));
            (*platform, stats)
        })
        .collect();

    Report {
        report_date: ctx.report_date.clone(),
        generated_at,
        total_analyzed: records.len(),
        per_platform_stats,
        overall_stats: compute_stats(records),
        trending_topics: extract_trending_topics(records),
        hot_takes: identify_hot_takes(records),
        evidence_file_paths: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn record(platform: Platform, sentiment: Sentiment) -> SentimentRecord {
        SentimentRecord {
            timestamp: Utc::now(),
            platform,
            source_url: format!("https://{}/thread", platform.as_str()),
            text_preview: "some text worth analyzing".to_string(),
            sentiment,
            intensity: Some(Intensity::Medium),
            confidence: 0.7,
            emotional_indicators: Vec::new(),
            reasoning: String::new(),
            topics: Vec::new(),
        }
    }

    fn with_topics(mut r: SentimentRecord, topics: &[&str]) -> SentimentRecord {
        r.topics = topics.iter().map(|t| (*t).to_string()).collect();
        r
    }

    fn hot(mut r: SentimentRecord, confidence: f64) -> SentimentRecord {
        r.intensity = Some(Intensity::High);
        r.confidence = confidence;
        r
    }

    #[test]
    fn empty_input_is_all_zero() {
        let stats = compute_stats(&Vec::<SentimentRecord>::new());
        assert_eq!(stats, SentimentStats::default());
        assert_eq!(stats.count, 0);
    }

    #[test]
    fn percentages_sum_to_hundred() {
        let records = vec![
            record(Platform::Reddit, Sentiment::Positive),
            record(Platform::Reddit, Sentiment::Negative),
            record(Platform::X, Sentiment::Neutral),
        ];
        let stats = compute_stats(&records);
        assert_eq!(stats.count, 3);
        assert!((stats.positive_pct - 33.3).abs() < 1e-9);
        let sum = stats.positive_pct + stats.negative_pct + stats.neutral_pct;
        assert!((sum - 100.0).abs() <= 0.1 + 1e-9, "sum was {sum}");
    }

    fn mixed(positive: usize, negative: usize, neutral: usize) -> Vec<SentimentRecord> {
        let mut records = Vec::with_capacity(positive + negative + neutral);
        records.extend((0..positive).map(|_| record(Platform::X, Sentiment::Positive)));
        records.extend((0..negative).map(|_| record(Platform::X, Sentiment::Negative)));
        records.extend((0..neutral).map(|_| record(Platform::X, Sentiment::Neutral)));
        records
    }

    #[test]
    fn percentages_stay_in_range_for_every_split() {
        for total in 1..=60 {
            for positive in 0..=total {
                for negative in 0..=(total - positive) {
                    let neutral = total - positive - negative;
                    let stats = compute_stats(&mixed(positive, negative, neutral));
                    let ctx = format!("{positive}/{negative}/{neutral}: {stats:?}");
                    assert_eq!(stats.count, total);
                    for pct in [stats.positive_pct, stats.negative_pct, stats.neutral_pct] {
                        assert!((0.0..=100.0).contains(&pct), "{ctx}");
                    }
                    let sum = stats.positive_pct + stats.negative_pct + stats.neutral_pct;
                    assert!((sum - 100.0).abs() <= 0.1 + 1e-9, "{ctx}");
                }
            }
        }
    }

    #[test]
    fn label_without_records_reports_zero() {
        // 1/16 and 15/16 both round up.
        let stats = compute_stats(&mixed(1, 15, 0));
        assert!((stats.positive_pct - 6.3).abs() < 1e-9);
        assert!((stats.negative_pct - 93.8).abs() < 1e-9);
        assert!(stats.neutral_pct.abs() < f64::EPSILON);
    }

    #[test]
    fn trending_topics_rank_by_mentions_then_first_seen() {
        let records = vec![
            with_topics(record(Platform::Reddit, Sentiment::Positive), &["Rust", "AI"]),
            with_topics(record(Platform::X, Sentiment::Negative), &["ai", "Economy"]),
            with_topics(record(Platform::X, Sentiment::Negative), &["AI", "economy", "rust"]),
            with_topics(record(Platform::X, Sentiment::Neutral), &["Weather"]),
        ];
        let topics = extract_trending_topics(&records);
        let names: Vec<&str> = topics.iter().map(|t| t.topic.as_str()).collect();
        assert_eq!(names, vec!["AI", "Rust", "Economy", "Weather"]);
        assert_eq!(topics[0].mention_count, 3);
        assert_eq!(topics[0].dominant_sentiment, Sentiment::Negative);
        assert_eq!(topics[1].mention_count, 2);
    }

    #[test]
    fn topic_repeated_in_one_record_counts_once() {
        let records = vec![with_topics(
            record(Platform::Reddit, Sentiment::Positive),
            &["Rust", "rust", " RUST "],
        )];
        let topics = extract_trending_topics(&records);
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].mention_count, 1);
    }

    #[test]
    fn dominant_sentiment_tie_prefers_positive_then_negative() {
        let records = vec![
            with_topics(record(Platform::X, Sentiment::Negative), &["a", "b"]),
            with_topics(record(Platform::X, Sentiment::Positive), &["a"]),
            with_topics(record(Platform::X, Sentiment::Neutral), &["b"]),
        ];
        let topics = extract_trending_topics(&records);
        assert_eq!(topics[0].dominant_sentiment, Sentiment::Positive);
        assert_eq!(topics[1].dominant_sentiment, Sentiment::Negative);
    }

    #[test]
    fn no_topics_means_no_trending() {
        let records = vec![record(Platform::Reddit, Sentiment::Positive)];
        assert!(extract_trending_topics(&records).is_empty());
    }

    #[test]
    fn hot_takes_require_high_intensity_and_confidence() {
        let records = vec![
            hot(record(Platform::X, Sentiment::Negative), 0.9),
            hot(record(Platform::X, Sentiment::Negative), 0.8),
            record(Platform::X, Sentiment::Positive),
            {
                let mut r = record(Platform::Reddit, Sentiment::Positive);
                r.confidence = 0.95;
                r
            },
        ];
        let takes = identify_hot_takes(&records);
        assert_eq!(takes.len(), 1);
        assert!((takes[0].confidence - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn hot_takes_are_capped_in_input_order() {
        let records: Vec<SentimentRecord> = (0..8)
            .map(|i| {
                let mut r = hot(record(Platform::Reddit, Sentiment::Positive), 0.9);
                r.source_url = format!("https://www.reddit.com/r/a/comments/{i}");
                r
            })
            .collect();
        let takes = identify_hot_takes(&records);
        assert_eq!(takes.len(), MAX_HOT_TAKES);
        assert!(takes[0].source_url.ends_with("/0"));
        assert!(takes[4].source_url.ends_with("/4"));
        for take in &takes {
            assert!(take.confidence > HOT_TAKE_CONFIDENCE);
            assert_eq!(take.intensity, Some(Intensity::High));
        }
    }

    #[test]
    fn hot_take_preview_is_shortened() {
        let mut r = hot(record(Platform::X, Sentiment::Negative), 0.95);
        r.text_preview = "w".repeat(300);
        let takes = identify_hot_takes(&[r]);
        assert_eq!(takes[0].text_preview, format!("{}...", "w".repeat(100)));
    }

    #[test]
    fn short_hot_take_preview_still_ends_in_ellipsis() {
        let mut r = hot(record(Platform::X, Sentiment::Negative), 0.95);
        r.text_preview = "prices are a scam".to_string();
        let takes = identify_hot_takes(&[r]);
        assert_eq!(takes[0].text_preview, "prices are a scam...");
    }

    #[test]
    fn report_lists_every_platform() {
        let ctx = RunContext::new(Path::new("/tmp"), Utc::now());
        let records = vec![
            record(Platform::Reddit, Sentiment::Positive),
            record(Platform::Reddit, Sentiment::Negative),
        ];
        let report = build_report(&ctx, &records, Utc::now());
        assert_eq!(report.total_analyzed, 2);
        assert_eq!(report.per_platform_stats[&Platform::Reddit].count, 2);
        assert_eq!(report.per_platform_stats[&Platform::X].count, 0);
        assert_eq!(report.overall_stats.count, 2);
        assert_eq!(report.report_date, ctx.report_date);
        assert!(report.evidence_file_paths.is_empty());
    }
}
