//! Reddit text source using the public `.json` view of a page.
//!
//! A thread URL yields its comment tree (flattened depth-first); a
//! subreddit or front-page listing yields post titles with their self-text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Deserializer};

use crate::error::SentimentError;
use crate::extract::TextSource;
use crate::platform::Platform;

const DEFAULT_BASE_URL: &str = "https://www.reddit.com";
const PAGE_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
struct Thing {
    kind: String,
    #[serde(default)]
    data: ThingData,
}

#[derive(Debug, Default, Deserialize)]
struct ThingData {
    body: Option<String>,
    title: Option<String>,
    selftext: Option<String>,
    /// Reddit sends `""` instead of a listing when there are no replies.
    #[serde(default, deserialize_with = "replies_listing")]
    replies: Option<Listing>,
}

fn replies_listing<'de, D>(deserializer: D) -> Result<Option<Listing>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

pub struct RedditThreadSource {
    client: Client,
    base_url: String,
}

impl RedditThreadSource {
    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, SentimentError> {
        Self::with_base_url(timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// Point the source at a different host (wiremock in tests).
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, SentimentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Map a page URL onto its `.json` twin under `base_url`, keeping the
    /// original query (e.g. `t=day`).
    fn json_url(&self, url: &str) -> Result<Url, SentimentError> {
        let invalid = |message: String| SentimentError::Extraction {
            url: url.to_string(),
            message,
        };
        let page = Url::parse(url).map_err(|e| invalid(format!("invalid URL: {e}")))?;
        let path = page.path().trim_end_matches('/');
        let mut json = Url::parse(&format!("{}{path}.json", self.base_url))
            .map_err(|e| invalid(format!("invalid listing URL: {e}")))?;
        {
            let mut query = json.query_pairs_mut();
            for (key, value) in page.query_pairs() {
                if key != "limit" && key != "raw_json" {
                    query.append_pair(&key, &value);
                }
            }
            query.append_pair("limit", &PAGE_LIMIT.to_string());
            query.append_pair("raw_json", "1");
        }
        Ok(json)
    }
}

#[async_trait]
impl TextSource for RedditThreadSource {
    async fn fetch_texts(
        &self,
        url: &str,
        platform: Platform,
    ) -> Result<Vec<String>, SentimentError> {
        if platform != Platform::Reddit {
            return Err(SentimentError::Extraction {
                url: url.to_string(),
                message: format!("reddit source cannot read {platform} pages"),
            });
        }

        let endpoint = self.json_url(url)?;
        let response = self.client.get(endpoint).send().await?;

        if !response.status().is_success() {
            return Err(SentimentError::Extraction {
                url: url.to_string(),
                message: format!("reddit returned status {}", response.status()),
            });
        }

        let body: serde_json::Value = response.json().await?;
        let texts = texts_from_page(body).map_err(|e| SentimentError::Extraction {
            url: url.to_string(),
            message: format!("unexpected reddit response shape: {e}"),
        })?;

        tracing::debug!(url, count = texts.len(), "collected reddit texts");
        Ok(texts)
    }

    fn name(&self) -> &str {
        "reddit_json"
    }
}

/// A thread page is `[post_listing, comment_listing]`; anything else is a
/// single listing of posts.
fn texts_from_page(body: serde_json::Value) -> Result<Vec<String>, serde_json::Error> {
    let mut texts = Vec::new();
    match body {
        serde_json::Value::Array(listings) => {
            for value in listings.into_iter().skip(1) {
                let listing: Listing = serde_json::from_value(value)?;
                collect_listing(&listing, &mut texts);
            }
        }
        other => {
            let listing: Listing = serde_json::from_value(other)?;
            collect_listing(&listing, &mut texts);
        }
    }
    Ok(texts)
}

fn collect_listing(listing: &Listing, out: &mut Vec<String>) {
    for thing in &listing.data.children {
        match thing.kind.as_str() {
            "t1" => {
                if let Some(body) = usable(thing.data.body.as_deref()) {
                    out.push(body.to_string());
                }
            }
            "t3" => {
                if let Some(title) = usable(thing.data.title.as_deref()) {
                    match usable(thing.data.selftext.as_deref()) {
                        Some(selftext) => out.push(format!("{title} {selftext}")),
                        None => out.push(title.to_string()),
                    }
                }
            }
            _ => {}
        }
        if let Some(replies) = &thing.data.replies {
            collect_listing(replies, out);
        }
    }
}

fn usable(text: Option<&str>) -> Option<&str> {
    text.map(str::trim)
        .filter(|t| !t.is_empty() && *t != "[deleted]" && *t != "[removed]")
}
