use std::env;
use std::time::Duration;

use tracing::info;

use crate::error::PipelineError;

const DEFAULT_TONE_API_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_TONE_MODEL: &str = "llama-3.3-70b-versatile";
const DEFAULT_REDDIT_BASE_URL: &str = "https://www.reddit.com/r/news";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Tone-scoring service
    pub tone_api_key: String,
    pub tone_api_url: String,
    pub tone_model: String,

    // Content source
    pub reddit_base_url: String,
    pub user_agent: Option<String>,
    pub post_limit: u32,

    // Pipeline
    pub max_concurrent_items: usize,
    pub sample_size: usize,
    pub sample_seed: Option<u64>,
    pub preview_timeout: Duration,
    pub reaction_timeout: Duration,
    pub scoring_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables. Only `TONE_API_KEY`
    /// is required.
    pub fn from_env() -> Result<Self, PipelineError> {
        Ok(Self {
            tone_api_key: required_env("TONE_API_KEY")?,
            tone_api_url: env_or("TONE_API_URL", DEFAULT_TONE_API_URL),
            tone_model: env_or("TONE_MODEL", DEFAULT_TONE_MODEL),
            reddit_base_url: env_or("REDDIT_BASE_URL", DEFAULT_REDDIT_BASE_URL),
            user_agent: env::var("NEWSPULSE_USER_AGENT").ok(),
            post_limit: parsed_env("POST_LIMIT", 10)?,
            max_concurrent_items: parsed_env("MAX_CONCURRENT_ITEMS", 8)?,
            sample_size: parsed_env("SAMPLE_SIZE", 5)?,
            sample_seed: optional_parsed_env("SAMPLE_SEED")?,
            preview_timeout: Duration::from_secs(parsed_env("PREVIEW_TIMEOUT_SECS", 10)?),
            reaction_timeout: Duration::from_secs(parsed_env("REACTION_TIMEOUT_SECS", 15)?),
            scoring_timeout: Duration::from_secs(parsed_env("SCORING_TIMEOUT_SECS", 30)?),
        })
    }

    /// Log the effective configuration without secrets.
    pub fn log_redacted(&self) {
        info!(
            tone_api_url = self.tone_api_url.as_str(),
            tone_model = self.tone_model.as_str(),
            tone_api_key_set = !self.tone_api_key.is_empty(),
            reddit_base_url = self.reddit_base_url.as_str(),
            custom_user_agent = self.user_agent.is_some(),
            post_limit = self.post_limit,
            max_concurrent_items = self.max_concurrent_items,
            sample_size = self.sample_size,
            sample_seed = ?self.sample_seed,
            preview_timeout_secs = self.preview_timeout.as_secs(),
            reaction_timeout_secs = self.reaction_timeout.as_secs(),
            scoring_timeout_secs = self.scoring_timeout.as_secs(),
            "Loaded config"
        );
    }
}

fn required_env(key: &str) -> Result<String, PipelineError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(PipelineError::Config(format!(
            "{key} environment variable is required"
        ))),
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, PipelineError> {
    Ok(optional_parsed_env(key)?.unwrap_or(default))
}

fn optional_parsed_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>, PipelineError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| PipelineError::Config(format!("{key} must be a number, got '{raw}'"))),
        Err(_) => Ok(None),
    }
}
