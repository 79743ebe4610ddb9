//! Platform detection from source URLs.

use serde::{Deserialize, Serialize};

use crate::error::SentimentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Reddit,
    X,
}

/// Host suffixes per platform. A host matches when it equals the suffix or
/// is a subdomain of it, so `netflix.com` is not mistaken for `x.com`.
const HOST_SUFFIXES: &[(&str, Platform)] = &[
    ("reddit.com", Platform::Reddit),
    ("x.com", Platform::X),
    ("twitter.com", Platform::X),
];

const REDDIT_SEEDS: &[&str] = &[
    "https://www.reddit.com/r/all/top/?t=day",
    "https://www.reddit.com/r/technology/hot/",
    "https://www.reddit.com/r/worldnews/hot/",
    "https://www.reddit.com/r/politics/hot/",
    "https://www.reddit.com/r/AskReddit/hot/",
];

const X_SEEDS: &[&str] = &[
    "https://x.com/explore/tabs/trending",
    "https://x.com/search?q=%23trending&src=trend_click&vertical=trends",
];

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Reddit, Platform::X];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Reddit => "reddit",
            Platform::X => "x",
        }
    }

    /// Fixed discovery URLs used by the daily run.
    #[must_use]
    pub fn trending_seed_urls(self) -> &'static [&'static str] {
        match self {
            Platform::Reddit => REDDIT_SEEDS,
            Platform::X => X_SEEDS,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify `url` by its host.
///
/// # Errors
///
/// Returns [`SentimentError::UnsupportedPlatform`] carrying the host when no
/// known platform matches. An unparseable URL reports the raw input instead.
pub fn detect_platform(url: &str) -> Result<Platform, SentimentError> {
    let trimmed = url.trim();
    let parsed = reqwest::Url::parse(trimmed).map_err(|_| SentimentError::UnsupportedPlatform {
        host: trimmed.to_string(),
    })?;
    let host = parsed
        .host_str()
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    HOST_SUFFIXES
        .iter()
        .find(|(suffix, _)| {
            host == *suffix
                || host
                    .strip_suffix(suffix)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
        .map(|&(_, platform)| platform)
        .ok_or(SentimentError::UnsupportedPlatform { host })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_reddit() {
        assert_eq!(
            detect_platform("https://www.reddit.com/r/all/top").unwrap(),
            Platform::Reddit
        );
        assert_eq!(
            detect_platform("https://old.reddit.com/r/rust/comments/1/x/").unwrap(),
            Platform::Reddit
        );
    }

    #[test]
    fn detects_x_and_twitter() {
        assert_eq!(detect_platform("https://x.com/explore").unwrap(), Platform::X);
        assert_eq!(
            detect_platform("https://mobile.twitter.com/user/status/1").unwrap(),
            Platform::X
        );
    }

    #[test]
    fn host_match_is_case_insensitive() {
        assert_eq!(
            detect_platform("https://WWW.Reddit.COM/r/news").unwrap(),
            Platform::Reddit
        );
    }

    #[test]
    fn unknown_host_is_rejected_with_host() {
        let err = detect_platform("https://example.com").unwrap_err();
        assert!(
            matches!(err, SentimentError::UnsupportedPlatform { ref host } if host == "example.com"),
            "got: {err:?}"
        );
    }

    #[test]
    fn lookalike_hosts_are_rejected() {
        assert!(detect_platform("https://netflix.com/browse").is_err());
        assert!(detect_platform("https://notreddit.com/r/all").is_err());
    }

    #[test]
    fn unparseable_url_is_rejected() {
        let err = detect_platform("not a url").unwrap_err();
        assert!(matches!(err, SentimentError::UnsupportedPlatform { ref host } if host == "not a url"));
    }

    #[test]
    fn every_seed_url_detects_as_its_platform() {
        for platform in Platform::ALL {
            for url in platform.trending_seed_urls() {
                assert_eq!(detect_platform(url).unwrap(), platform, "seed {url}");
            }
        }
    }
}
