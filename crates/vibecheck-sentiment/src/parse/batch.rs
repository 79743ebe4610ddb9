use std::collections::HashSet;

use serde::{Deserialize, Deserializer};

use super::{clamp_confidence, DEFAULT_CONFIDENCE};
use crate::error::SentimentError;
use crate::types::{BatchSummary, Intensity, Sentiment};

/// One validated per-text result. `text_id` is guaranteed to be in range.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    pub text_id: usize,
    pub sentiment: Sentiment,
    pub intensity: Option<Intensity>,
    pub confidence: f64,
    pub emotional_indicators: Vec<String>,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBatch {
    /// In reply order, without out-of-range or duplicate ids.
    pub entries: Vec<BatchEntry>,
    pub summary: Option<BatchSummary>,
}

#[derive(Deserialize)]
struct RawReply {
    analysis: Vec<serde_json::Value>,
    #[serde(default)]
    batch_summary: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct RawEntry {
    #[serde(deserialize_with = "lenient_i64")]
    text_id: Option<i64>,
    #[serde(default)]
    sentiment: Option<String>,
    #[serde(default)]
    intensity: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    confidence: Option<f64>,
    #[serde(default)]
    emotional_indicators: Vec<String>,
    #[serde(default)]
    reasoning: Option<String>,
}

#[derive(Deserialize)]
struct RawSummary {
    #[serde(default, deserialize_with = "lenient_f64")]
    positive_pct: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    negative_pct: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    neutral_pct: Option<f64>,
    #[serde(default)]
    dominant_emotions: Vec<String>,
    #[serde(default)]
    key_topics: Vec<String>,
}

/// Accepts `0.8`, `"0.8"` or `null`.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    })
}

/// Accepts `3` or `"3"`.
fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Cut the JSON object out of a reply that may be wrapped in code fences or prose.
fn json_payload(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (start < end).then(|| &raw[start..=end])
}

/// Parse a batch reply for a batch of `batch_len` texts.
///
/// Entries with an out-of-range or repeated `text_id`, or that do not have
/// the entry shape at all, are dropped and logged.
///
/// # Errors
///
/// Returns [`SentimentError::Parse`] when the reply holds no JSON object with
/// an `analysis` array. The caller must then discard the whole batch.
pub fn parse_batch_response(raw: &str, batch_len: usize) -> Result<ParsedBatch, SentimentError> {
    let payload = json_payload(raw)
        .ok_or_else(|| SentimentError::Parse("no JSON object in batch reply".to_string()))?;
    let reply: RawReply = serde_json::from_str(payload)
        .map_err(|e| SentimentError::Parse(format!("batch reply is not valid JSON: {e}")))?;

    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(reply.analysis.len());

    for (position, value) in reply.analysis.into_iter().enumerate() {
        let raw_entry: RawEntry = match serde_json::from_value(value) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(position, error = %e, "dropping malformed batch entry");
                continue;
            }
        };

        let Some(text_id) = raw_entry
            .text_id
            .and_then(|id| usize::try_from(id).ok())
            .filter(|id| *id < batch_len)
        else {
            tracing::warn!(
                position,
                text_id = ?raw_entry.text_id,
                batch_len,
                "dropping batch entry with out-of-range text_id"
            );
            continue;
        };

        if !seen.insert(text_id) {
            tracing::warn!(position, text_id, "dropping batch entry with duplicate text_id");
            continue;
        }

        entries.push(BatchEntry {
            text_id,
            sentiment: raw_entry
                .sentiment
                .as_deref()
                .map_or(Sentiment::Neutral, Sentiment::from_label),
            intensity: raw_entry.intensity.as_deref().and_then(Intensity::from_label),
            confidence: clamp_confidence(raw_entry.confidence.unwrap_or(DEFAULT_CONFIDENCE)),
            emotional_indicators: raw_entry
                .emotional_indicators
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            reasoning: raw_entry.reasoning.unwrap_or_default().trim().to_string(),
        });
    }

    let summary = reply.batch_summary.and_then(|value| {
        serde_json::from_value::<RawSummary>(value)
            .map_err(|e| tracing::warn!(error = %e, "ignoring malformed batch_summary"))
            .ok()
            .map(|s| BatchSummary {
                positive_pct: s.positive_pct.unwrap_or_default(),
                negative_pct: s.negative_pct.unwrap_or_default(),
                neutral_pct: s.neutral_pct.unwrap_or_default(),
                dominant_emotions: s.dominant_emotions,
                key_topics: s
                    .key_topics
                    .into_iter()
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect(),
            })
    });

    Ok(ParsedBatch { entries, summary })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply_with_ids(ids: &[i64]) -> String {
        let analysis: Vec<serde_json::Value> = ids
            .iter()
            .map(|id| {
                serde_json::json!({
                    "text_id": id,
                    "sentiment": "positive",
                    "intensity": "high",
                    "confidence": 0.9,
                    "emotional_indicators": ["joy"],
                    "reasoning": "upbeat"
                })
            })
            .collect();
        serde_json::json!({ "analysis": analysis }).to_string()
    }

    #[test]
    fn parses_full_reply() {
        let raw = r#"{
            "analysis": [
                {"text_id": 0, "sentiment": "Positive", "intensity": "HIGH", "confidence": 0.91,
                 "emotional_indicators": ["excitement", " "], "reasoning": " loves it "},
                {"text_id": 1, "sentiment": "negative", "intensity": "low", "confidence": 0.4,
                 "emotional_indicators": [], "reasoning": "mild complaint"}
            ],
            "batch_summary": {"positive_pct": 50, "negative_pct": 50, "neutral_pct": 0,
                              "dominant_emotions": ["excitement"], "key_topics": ["rust", "  "]}
        }"#;
        let parsed = parse_batch_response(raw, 2).unwrap();
        assert_eq!(parsed.entries.len(), 2);
        let first = &parsed.entries[0];
        assert_eq!(first.sentiment, Sentiment::Positive);
        assert_eq!(first.intensity, Some(Intensity::High));
        assert_eq!(first.emotional_indicators, vec!["excitement".to_string()]);
        assert_eq!(first.reasoning, "loves it");
        let summary = parsed.summary.unwrap();
        assert_eq!(summary.key_topics, vec!["rust".to_string()]);
        assert!((summary.positive_pct - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn out_of_range_text_id_is_dropped() {
        let raw = reply_with_ids(&[0, 1, 7, 2, 3, 4]);
        let parsed = parse_batch_response(&raw, 5).unwrap();
        let ids: Vec<usize> = parsed.entries.iter().map(|e| e.text_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn negative_and_duplicate_ids_are_dropped() {
        let raw = reply_with_ids(&[-1, 0, 0, 1]);
        let parsed = parse_batch_response(&raw, 2).unwrap();
        let ids: Vec<usize> = parsed.entries.iter().map(|e| e.text_id).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn fenced_reply_with_prose_is_accepted() {
        let raw = format!("Here is the analysis:\n```json\n{}\n```\nLet me know!", reply_with_ids(&[0]));
        let parsed = parse_batch_response(&raw, 1).unwrap();
        assert_eq!(parsed.entries.len(), 1);
        assert!(parsed.summary.is_none());
    }

    #[test]
    fn confidence_is_clamped_and_lenient() {
        let raw = r#"{"analysis": [
            {"text_id": 0, "sentiment": "neutral", "confidence": 1.4},
            {"text_id": "1", "sentiment": "neutral", "confidence": "-0.2"},
            {"text_id": 2, "sentiment": "neutral"}
        ]}"#;
        let parsed = parse_batch_response(raw, 3).unwrap();
        let confidences: Vec<f64> = parsed.entries.iter().map(|e| e.confidence).collect();
        assert_eq!(confidences, vec![1.0, 0.0, 0.5]);
    }

    #[test]
    fn malformed_entry_is_dropped_not_fatal() {
        let raw = r#"{"analysis": [
            "just a string",
            {"text_id": 0, "sentiment": "negative", "intensity": "extreme", "confidence": 0.7}
        ]}"#;
        let parsed = parse_batch_response(raw, 1).unwrap();
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.entries[0].intensity, None);
    }

    #[test]
    fn non_json_reply_is_parse_error() {
        let err = parse_batch_response("Sorry, I cannot analyze these texts.", 3).unwrap_err();
        assert!(matches!(err, SentimentError::Parse(_)));
    }

    #[test]
    fn missing_analysis_array_is_parse_error() {
        let err = parse_batch_response(r#"{"batch_summary": {}}"#, 3).unwrap_err();
        assert!(matches!(err, SentimentError::Parse(_)));
    }

    #[test]
    fn truncated_json_is_parse_error() {
        let err = parse_batch_response(r#"{"analysis": [{"text_id": 0}"#, 1).unwrap_err();
        assert!(matches!(err, SentimentError::Parse(_)));
    }
}
