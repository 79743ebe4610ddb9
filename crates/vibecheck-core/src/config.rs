use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let env = parse_environment(&or_default("VIBECHECK_ENV", "development"))?;
    let log_level = or_default("VIBECHECK_LOG_LEVEL", "info");
    let evidence_root = PathBuf::from(or_default("VIBECHECK_EVIDENCE_ROOT", "."));

    let min_text_chars = parse_usize("VIBECHECK_MIN_TEXT_CHARS", "10")?;
    let max_texts_per_url = parse_usize("VIBECHECK_MAX_TEXTS_PER_URL", "50")?;
    let batch_size = parse_usize("VIBECHECK_BATCH_SIZE", "10")?;
    if batch_size == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "VIBECHECK_BATCH_SIZE".to_string(),
            reason: "batch size must be at least 1".to_string(),
        });
    }

    let inference_delay_ms = parse_u64("VIBECHECK_INFERENCE_DELAY_MS", "2000")?;
    let inference_jitter_ms = parse_u64("VIBECHECK_INFERENCE_JITTER_MS", "1000")?;
    let inference_max_retries = parse_u32("VIBECHECK_INFERENCE_MAX_RETRIES", "1")?;
    let inference_backoff_base_ms = parse_u64("VIBECHECK_INFERENCE_BACKOFF_BASE_MS", "2000")?;
    let request_timeout_secs = parse_u64("VIBECHECK_REQUEST_TIMEOUT_SECS", "60")?;
    let user_agent = or_default("VIBECHECK_USER_AGENT", "vibecheck/0.1 (sentiment-report)");

    let scraper_command = optional("VIBECHECK_SCRAPER_COMMAND").map(|raw| {
        raw.split_whitespace()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
    });

    let reasoning_api_url = or_default("REASONING_API_URL", "https://api.perplexity.ai");
    let reasoning_api_key = optional("REASONING_API_KEY");
    let reasoning_model = or_default("REASONING_MODEL", "sonar");

    Ok(AppConfig {
        env,
        log_level,
        evidence_root,
        min_text_chars,
        max_texts_per_url,
        batch_size,
        inference_delay_ms,
        inference_jitter_ms,
        inference_max_retries,
        inference_backoff_base_ms,
        request_timeout_secs,
        user_agent,
        scraper_command,
        reasoning_api_url,
        reasoning_api_key,
        reasoning_model,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "VIBECHECK_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
