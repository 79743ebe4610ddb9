//! Concrete [`TextSource`] adapters.

mod command;
mod reddit;

pub use command::CommandSource;
pub use reddit::RedditThreadSource;

use async_trait::async_trait;

use crate::error::SentimentError;
use crate::extract::TextSource;
use crate::platform::Platform;

/// Dispatches each URL to the source registered for its platform.
#[derive(Default)]
pub struct PlatformRouter {
    routes: Vec<(Platform, Box<dyn TextSource>)>,
}

impl PlatformRouter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `source` for `platform`, replacing any earlier registration.
    #[must_use]
    pub fn route(mut self, platform: Platform, source: Box<dyn TextSource>) -> Self {
        self.routes.retain(|(p, _)| *p != platform);
        self.routes.push((platform, source));
        self
    }

    #[must_use]
    pub fn handles(&self, platform: Platform) -> bool {
        self.routes.iter().any(|(p, _)| *p == platform)
    }
}

#[async_trait]
impl TextSource for PlatformRouter {
    async fn fetch_texts(
        &self,
        url: &str,
        platform: Platform,
    ) -> Result<Vec<String>, SentimentError> {
        let source = self
            .routes
            .iter()
            .find(|(p, _)| *p == platform)
            .map(|(_, s)| s)
            .ok_or_else(|| SentimentError::Extraction {
                url: url.to_string(),
                message: format!("no text source configured for {platform}"),
            })?;
        source.fetch_texts(url, platform).await
    }

    async fn release(&self) {
        for (platform, source) in &self.routes {
            tracing::debug!(%platform, source = source.name(), "releasing text source");
            source.release().await;
        }
    }

    fn name(&self) -> &str {
        "router"
    }
}
