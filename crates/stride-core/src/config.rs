use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::StrideError;

/// Top-level Stride configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub stride: StrideConfig,
    #[serde(default)]
    pub max: MaxConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub nlp: NlpConfig,
    #[serde(default)]
    pub sweeps: SweepConfig,
}

/// General bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrideConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for StrideConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
        }
    }
}

/// MAX Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaxConfig {
    /// Bot access token. Falls back to the `MAX_BOT_TOKEN` env var.
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_max_base_url")]
    pub base_url: String,
    /// Per-request timeout for send/edit calls.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Retry budget for transient send failures (5xx, network).
    #[serde(default = "default_send_retries")]
    pub send_retries: u32,
    /// Long-poll wait passed to GET /updates.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

impl Default for MaxConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            base_url: default_max_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            send_retries: default_send_retries(),
            poll_timeout_secs: default_poll_timeout_secs(),
        }
    }
}

impl MaxConfig {
    /// Resolve the access token, preferring config over environment.
    pub fn resolve_token(&self) -> Option<String> {
        if !self.access_token.is_empty() {
            return Some(self.access_token.clone());
        }
        std::env::var("MAX_BOT_TOKEN").ok().filter(|t| !t.is_empty())
    }
}

/// Durable storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// TTL bounds for the transient caches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Draft lifetime in seconds (refreshed on every write).
    #[serde(default = "default_draft_ttl_secs")]
    pub draft_ttl_secs: u64,
    /// Conversation context retention in days (hygiene bound).
    #[serde(default = "default_context_ttl_days")]
    pub context_ttl_days: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            draft_ttl_secs: default_draft_ttl_secs(),
            context_ttl_days: default_context_ttl_days(),
        }
    }
}

/// Ollama extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NlpConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,
    #[serde(default = "default_ollama_model")]
    pub model: String,
    #[serde(default = "default_nlp_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NlpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
            timeout_secs: default_nlp_timeout_secs(),
        }
    }
}

/// Background notification sweep settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Interval between deadline-reminder sweeps.
    #[serde(default = "default_reminder_interval_secs")]
    pub reminder_interval_secs: u64,
    /// Local hour (0-23) of the daily motivation push.
    #[serde(default = "default_motivation_hour")]
    pub motivation_hour: u32,
    /// Local hour (0-23) of the Sunday weekly summary.
    #[serde(default = "default_summary_hour")]
    pub summary_hour: u32,
    /// Delay between chats inside one sweep, in milliseconds.
    #[serde(default = "default_per_chat_delay_ms")]
    pub per_chat_delay_ms: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reminder_interval_secs: default_reminder_interval_secs(),
            motivation_hour: default_motivation_hour(),
            summary_hour: default_summary_hour(),
            per_chat_delay_ms: default_per_chat_delay_ms(),
        }
    }
}

fn default_name() -> String {
    "stride".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_base_url() -> String {
    "https://botapi.max.ru".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_send_retries() -> u32 {
    2
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_db_path() -> String {
    "stride.db".to_string()
}

fn default_draft_ttl_secs() -> u64 {
    3600
}

fn default_context_ttl_days() -> u64 {
    30
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.1".to_string()
}

fn default_nlp_timeout_secs() -> u64 {
    60
}

fn default_reminder_interval_secs() -> u64 {
    3600
}

fn default_motivation_hour() -> u32 {
    16
}

fn default_summary_hour() -> u32 {
    20
}

fn default_per_chat_delay_ms() -> u64 {
    50
}

fn default_true() -> bool {
    true
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, StrideError> {
    let path = Path::new(path);
    if !path.exists() {
        tracing::info!("Config file not found at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| StrideError::Config(format!("failed to read {}: {e}", path.display())))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| StrideError::Config(format!("failed to parse config: {e}")))?;

    Ok(config)
}
