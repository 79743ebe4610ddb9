use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Directory under which `evidence_<date>/` run folders are created.
    pub evidence_root: PathBuf,
    pub min_text_chars: usize,
    pub max_texts_per_url: usize,
    pub batch_size: usize,
    pub inference_delay_ms: u64,
    pub inference_jitter_ms: u64,
    pub inference_max_retries: u32,
    pub inference_backoff_base_ms: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// External scraper invocation, already split on whitespace.
    pub scraper_command: Option<Vec<String>>,
    pub reasoning_api_url: String,
    pub reasoning_api_key: Option<String>,
    pub reasoning_model: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("evidence_root", &self.evidence_root)
            .field("min_text_chars", &self.min_text_chars)
            .field("max_texts_per_url", &self.max_texts_per_url)
            .field("batch_size", &self.batch_size)
            .field("inference_delay_ms", &self.inference_delay_ms)
            .field("inference_jitter_ms", &self.inference_jitter_ms)
            .field("inference_max_retries", &self.inference_max_retries)
            .field("inference_backoff_base_ms", &self.inference_backoff_base_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("scraper_command", &self.scraper_command)
            .field("reasoning_api_url", &self.reasoning_api_url)
            .field(
                "reasoning_api_key",
                &self.reasoning_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("reasoning_model", &self.reasoning_model)
            .finish()
    }
}
