//! Text extraction over an external scraping driver.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::SentimentError;
use crate::platform::Platform;
use crate::types::TextUnit;

/// Anything that can turn a page URL into raw comment/reply bodies.
///
/// Implementations own whatever session they need (browser, HTTP client,
/// subprocess). The pipeline calls [`TextSource::release`] exactly once when
/// it finishes, whether or not the run completed.
#[async_trait]
pub trait TextSource: Send + Sync {
    async fn fetch_texts(&self, url: &str, platform: Platform)
        -> Result<Vec<String>, SentimentError>;

    async fn release(&self) {}

    fn name(&self) -> &str {
        "unknown"
    }
}

/// Validates raw captures into [`TextUnit`]s.
#[derive(Debug, Clone)]
pub struct TextExtractor {
    min_chars: usize,
    max_units: usize,
}

impl TextExtractor {
    /// `max_units == 0` disables the per-URL cap.
    #[must_use]
    pub fn new(min_chars: usize, max_units: usize) -> Self {
        Self {
            min_chars,
            max_units,
        }
    }

    /// Fetch and filter texts for one URL.
    ///
    /// Driver failures are logged and yield an empty vec so sibling URLs
    /// still run.
    pub async fn extract(
        &self,
        source: &dyn TextSource,
        url: &str,
        platform: Platform,
    ) -> Vec<TextUnit> {
        match source.fetch_texts(url, platform).await {
            Ok(raw) => {
                let captured = raw.len();
                let units = self.filter_texts(raw, url, platform);
                tracing::info!(
                    url,
                    %platform,
                    source = source.name(),
                    captured,
                    kept = units.len(),
                    "extracted texts"
                );
                units
            }
            Err(e) => {
                tracing::warn!(
                    url,
                    %platform,
                    source = source.name(),
                    stage = "extract",
                    error = %e,
                    "text extraction failed"
                );
                Vec::new()
            }
        }
    }

    /// Trim, drop short noise, dedup exact repeats, and cap.
    #[must_use]
    pub fn filter_texts(&self, raw: Vec<String>, url: &str, platform: Platform) -> Vec<TextUnit> {
        let collected_at = Utc::now();
        let mut seen = HashSet::new();
        let mut units = Vec::new();

        for text in raw {
            let text = text.trim();
            if text.chars().count() < self.min_chars {
                continue;
            }
            if !seen.insert(text.to_string()) {
                continue;
            }
            units.push(TextUnit {
                platform,
                source_url: url.to_string(),
                text: text.to_string(),
                collected_at,
            });
            if self.max_units > 0 && units.len() >= self.max_units {
                break;
            }
        }

        units
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource(Result<Vec<String>, ()>);

    #[async_trait]
    impl TextSource for FixedSource {
        async fn fetch_texts(
            &self,
            url: &str,
            _platform: Platform,
        ) -> Result<Vec<String>, SentimentError> {
            self.0.clone().map_err(|()| SentimentError::Extraction {
                url: url.to_string(),
                message: "driver crashed".to_string(),
            })
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn short_strings_are_dropped() {
        let extractor = TextExtractor::new(10, 0);
        let units = extractor.filter_texts(
            strings(&["Reply", "   ok   ", "This is a real comment body"]),
            "https://x.com/a/status/1",
            Platform::X,
        );
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].text, "This is a real comment body");
        assert_eq!(units[0].platform, Platform::X);
    }

    #[test]
    fn exactly_min_chars_is_kept() {
        let extractor = TextExtractor::new(10, 0);
        let units = extractor.filter_texts(strings(&["0123456789"]), "u", Platform::Reddit);
        assert_eq!(units.len(), 1);
    }

    #[test]
    fn duplicates_are_collapsed_in_order() {
        let extractor = TextExtractor::new(3, 0);
        let units = extractor.filter_texts(
            strings(&["first comment", "second comment", "first comment"]),
            "u",
            Platform::Reddit,
        );
        let texts: Vec<&str> = units.iter().map(|u| u.text.as_str()).collect();
        assert_eq!(texts, vec!["first comment", "second comment"]);
    }

    #[test]
    fn cap_limits_units() {
        let extractor = TextExtractor::new(1, 2);
        let units = extractor.filter_texts(strings(&["aaa", "bbb", "ccc"]), "u", Platform::Reddit);
        assert_eq!(units.len(), 2);
    }

    #[tokio::test]
    async fn driver_failure_yields_empty() {
        let extractor = TextExtractor::new(10, 0);
        let source = FixedSource(Err(()));
        let units = extractor
            .extract(&source, "https://www.reddit.com/r/x", Platform::Reddit)
            .await;
        assert!(units.is_empty());
    }

    #[tokio::test]
    async fn extract_sets_source_url() {
        let extractor = TextExtractor::new(5, 0);
        let source = FixedSource(Ok(strings(&["hello from reddit"])));
        let units = extractor
            .extract(&source, "https://www.reddit.com/r/rust", Platform::Reddit)
            .await;
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].source_url, "https://www.reddit.com/r/rust");
    }
}
