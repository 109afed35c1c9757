use crate::draft::RetryPolicy;
use crate::error::{config_error, env_error, NotifierResult};
use crate::events::PriorityScale;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default Redis connection string
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
/// Default Redis hash holding event documents
pub const DEFAULT_EVENTS_KEY: &str = "campus_events";
/// Default Gemini model for draft generation
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
/// Optional file overriding the built-in defaults
pub const CONFIG_FILE: &str = "config/notifier.toml";

/// Main configuration structure
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis connection string for the event store
    pub redis_url: String,
    /// Redis hash holding event documents
    pub events_key: String,
    /// Gemini API key; without it drafts come from the local generator
    pub gemini_api_key: Option<String>,
    /// Gemini model name
    pub gemini_model: String,
    /// Priority vocabulary, lowest first
    pub priorities: PriorityScale,
    /// Retry behaviour for transient generation failures
    pub retry: RetryPolicy,
    /// Whether a failed first generation yields a local draft
    pub local_fallback: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: DEFAULT_REDIS_URL.to_string(),
            events_key: DEFAULT_EVENTS_KEY.to_string(),
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            priorities: PriorityScale::default(),
            retry: RetryPolicy::default(),
            local_fallback: true,
        }
    }
}

/// Overrides read from `config/notifier.toml`
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub priority_levels: Option<Vec<String>>,
    pub max_retries: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub backoff_factor: Option<f64>,
    pub local_fallback: Option<bool>,
}

impl ConfigFile {
    /// Read the override file if it exists
    pub fn read(path: &Path) -> NotifierResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        Ok(Some(toml::from_str(&content)?))
    }
}

impl Config {
    /// Load configuration from `.env`, the environment and the config file
    pub fn load() -> NotifierResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let file = ConfigFile::read(Path::new(CONFIG_FILE))?;
        Self::from_sources(|key| env::var(key).ok(), file)
    }

    /// Build the configuration from defaults, then the file, then variables
    pub fn from_sources<F>(var: F, file: Option<ConfigFile>) -> NotifierResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(file) = file {
            if let Some(levels) = file.priority_levels {
                config.priorities = PriorityScale::new(levels);
            }
            if let Some(max_retries) = file.max_retries {
                config.retry.max_retries = max_retries;
            }
            if let Some(delay) = file.retry_delay_ms {
                config.retry.initial_delay = Duration::from_millis(delay);
            }
            if let Some(factor) = file.backoff_factor {
                config.retry.backoff_factor = factor;
            }
            if let Some(local_fallback) = file.local_fallback {
                config.local_fallback = local_fallback;
            }
        }

        if let Some(url) = var("REDIS_URL") {
            config.redis_url = url;
        }
        if let Some(key) = var("EVENTS_KEY") {
            config.events_key = key;
        }
        config.gemini_api_key = var("GEMINI_API_KEY").filter(|key| !key.trim().is_empty());
        if let Some(model) = var("GEMINI_MODEL") {
            config.gemini_model = model;
        }
        if let Some(levels) = var("PRIORITY_LEVELS") {
            config.priorities = PriorityScale::parse(&levels);
        }
        if let Some(value) = var("GENERATION_MAX_RETRIES") {
            config.retry.max_retries = value
                .trim()
                .parse()
                .map_err(|_| env_error("GENERATION_MAX_RETRIES"))?;
        }
        if let Some(value) = var("GENERATION_RETRY_DELAY_MS") {
            let millis: u64 = value
                .trim()
                .parse()
                .map_err(|_| env_error("GENERATION_RETRY_DELAY_MS"))?;
            config.retry.initial_delay = Duration::from_millis(millis);
        }
        if let Some(value) = var("GENERATION_BACKOFF_FACTOR") {
            config.retry.backoff_factor = value
                .trim()
                .parse()
                .map_err(|_| env_error("GENERATION_BACKOFF_FACTOR"))?;
        }
        if let Some(value) = var("LOCAL_FALLBACK") {
            config.local_fallback = parse_flag(&value).ok_or_else(|| env_error("LOCAL_FALLBACK"))?;
        }

        if !(config.retry.backoff_factor.is_finite() && config.retry.backoff_factor >= 1.0) {
            return Err(config_error("backoff factor must be a finite number >= 1.0"));
        }

        Ok(config)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
