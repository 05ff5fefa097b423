use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::info;

use crate::error::MoodscanError;

pub const DEFAULT_MODEL: &str = "gpt-5.1-nano";
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 100;
const DEFAULT_SCAN_INTERVAL_MINUTES: u64 = 15;
const DEFAULT_MAX_MESSAGES_PER_SOURCE: usize = 200;
const DEFAULT_MAX_MESSAGES_PER_DAY: u64 = 1000;
const DEFAULT_CLASSIFY_TIMEOUT_SECS: u64 = 60;
const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 30;
const MAX_SCAN_INTERVAL_MINUTES: u64 = 24 * 60;

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub allowed_guild_ids: Vec<String>,
    pub status_webhook_url: Option<String>,
    pub source_timeout: Duration,

    // Classifier
    pub openai_api_key: String,
    pub openai_base_url: Option<String>,
    pub classifier_model: String,
    pub max_output_tokens: u32,
    pub classify_timeout: Duration,

    // Scanning
    pub scan_interval: Duration,
    pub max_messages_per_source: usize,
    pub max_messages_per_day: u64,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, MoodscanError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MoodscanError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let scan_interval_minutes: u64 =
            parse_or(&get, "SCAN_INTERVAL_MINUTES", DEFAULT_SCAN_INTERVAL_MINUTES)?;
        let classify_timeout_secs: u64 =
            parse_or(&get, "CLASSIFY_TIMEOUT_SECS", DEFAULT_CLASSIFY_TIMEOUT_SECS)?;
        let source_timeout_secs: u64 =
            parse_or(&get, "SOURCE_TIMEOUT_SECS", DEFAULT_SOURCE_TIMEOUT_SECS)?;

        let config = Self {
            discord_token: required(&get, "DISCORD_TOKEN")?,
            allowed_guild_ids: get("ALLOWED_GUILD_IDS")
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            status_webhook_url: get("STATUS_WEBHOOK_URL"),
            source_timeout: Duration::from_secs(source_timeout_secs),
            openai_api_key: required(&get, "OPENAI_API_KEY")?,
            openai_base_url: get("OPENAI_BASE_URL"),
            classifier_model: get("CLASSIFIER_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_output_tokens: parse_or(&get, "MAX_OUTPUT_TOKENS", DEFAULT_MAX_OUTPUT_TOKENS)?,
            classify_timeout: Duration::from_secs(classify_timeout_secs),
            scan_interval: Duration::from_secs(scan_interval_minutes.saturating_mul(60)),
            max_messages_per_source: parse_or(
                &get,
                "MAX_MESSAGES_PER_SOURCE",
                DEFAULT_MAX_MESSAGES_PER_SOURCE,
            )?,
            max_messages_per_day: parse_or(
                &get,
                "MAX_MESSAGES_PER_DAY",
                DEFAULT_MAX_MESSAGES_PER_DAY,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), MoodscanError> {
        let zero = |name: &str| MoodscanError::Config(format!("{name} must be greater than zero"));

        if self.scan_interval.is_zero() {
            return Err(zero("SCAN_INTERVAL_MINUTES"));
        }
        if self.scan_interval > Duration::from_secs(MAX_SCAN_INTERVAL_MINUTES * 60) {
            return Err(MoodscanError::Config(format!(
                "SCAN_INTERVAL_MINUTES must be at most {MAX_SCAN_INTERVAL_MINUTES}"
            )));
        }
        if self.max_messages_per_source == 0 {
            return Err(zero("MAX_MESSAGES_PER_SOURCE"));
        }
        if self.max_messages_per_day == 0 {
            return Err(zero("MAX_MESSAGES_PER_DAY"));
        }
        if self.max_output_tokens == 0 {
            return Err(zero("MAX_OUTPUT_TOKENS"));
        }
        if self.classify_timeout.is_zero() {
            return Err(zero("CLASSIFY_TIMEOUT_SECS"));
        }
        if self.source_timeout.is_zero() {
            return Err(zero("SOURCE_TIMEOUT_SECS"));
        }
        Ok(())
    }

    /// Log the effective settings without secrets.
    pub fn log_redacted(&self) {
        info!(
            model = self.classifier_model.as_str(),
            openai_base_url = self.openai_base_url.as_deref().unwrap_or("default"),
            max_output_tokens = self.max_output_tokens,
            classify_timeout_secs = self.classify_timeout.as_secs(),
            source_timeout_secs = self.source_timeout.as_secs(),
            scan_interval_minutes = self.scan_interval.as_secs() / 60,
            max_messages_per_source = self.max_messages_per_source,
            max_messages_per_day = self.max_messages_per_day,
            allowed_guilds = self.allowed_guild_ids.len(),
            status_webhook = self.status_webhook_url.is_some(),
            "Configuration loaded"
        );
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("discord_token", &"[redacted]")
            .field("allowed_guild_ids", &self.allowed_guild_ids)
            .field(
                "status_webhook_url",
                &self.status_webhook_url.as_ref().map(|_| "[redacted]"),
            )
            .field("source_timeout", &self.source_timeout)
            .field("openai_api_key", &"[redacted]")
            .field("openai_base_url", &self.openai_base_url)
            .field("classifier_model", &self.classifier_model)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("classify_timeout", &self.classify_timeout)
            .field("scan_interval", &self.scan_interval)
            .field("max_messages_per_source", &self.max_messages_per_source)
            .field("max_messages_per_day", &self.max_messages_per_day)
            .finish()
    }
}

fn required(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, MoodscanError> {
    get(key).ok_or_else(|| MoodscanError::Config(format!("{key} environment variable is required")))
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, MoodscanError> {
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| MoodscanError::Config(format!("{key} has invalid value '{raw}'"))),
        None => Ok(default),
    }
}
