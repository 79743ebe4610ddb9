use thiserror::Error;

#[derive(Debug, Error)]
pub enum SentimentError {
    #[error("unsupported platform: {host}")]
    UnsupportedPlatform { host: String },

    #[error("extraction failed for {url}: {message}")]
    Extraction { url: String, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("reasoning backend returned status {status}: {body}")]
    InferenceStatus { status: u16, body: String },

    #[error("inference error: {0}")]
    Inference(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("failed to persist {path}: {message}")]
    Persistence { path: String, message: String },
}

impl SentimentError {
    /// Only persistence failures may end a run; everything else degrades.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, SentimentError::Persistence { .. })
    }

    pub(crate) fn persistence(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        SentimentError::Persistence {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}
