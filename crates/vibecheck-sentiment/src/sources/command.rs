//! Text source backed by an external scraper executable.
//!
//! Runs `<program> <args...> <url>` and expects a JSON array of strings on
//! stdout, one entry per captured comment or reply. Scrolling and page
//! loading are the executable's business.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::SentimentError;
use crate::extract::TextSource;
use crate::platform::Platform;

pub struct CommandSource {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandSource {
    /// Build from a split command line; the first element is the program.
    ///
    /// Returns `None` for an empty command line.
    #[must_use]
    pub fn from_command_line(parts: &[String], timeout: Duration) -> Option<Self> {
        let (program, args) = parts.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            timeout,
        })
    }
}

#[async_trait]
impl TextSource for CommandSource {
    async fn fetch_texts(
        &self,
        url: &str,
        platform: Platform,
    ) -> Result<Vec<String>, SentimentError> {
        let extraction = |message: String| SentimentError::Extraction {
            url: url.to_string(),
            message,
        };

        let child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(url)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| extraction(format!("scraper timed out after {:?}", self.timeout)))?
            .map_err(|e| extraction(format!("scraper subprocess error: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(extraction(format!(
                "scraper exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let texts: Vec<String> = serde_json::from_slice(&output.stdout)
            .map_err(|e| extraction(format!("scraper output is not a JSON string array: {e}")))?;

        tracing::debug!(url, %platform, count = texts.len(), "scraper returned texts");
        Ok(texts)
    }

    fn name(&self) -> &str {
        "command"
    }
}
