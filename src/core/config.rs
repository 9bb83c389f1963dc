//! Runtime configuration loaded from the environment (and `.env` via dotenv).

use std::env;
use std::time::Duration;

use reqwest::Url;

/// Origins the payment provider iframe may post transaction messages from.
pub const DEFAULT_PAYMENT_ORIGINS: &[&str] = &[
    "https://secure.cardcom.solutions",
    "https://direct.tranzila.com",
];

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const DEFAULT_POLL_ATTEMPTS: u32 = 24;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the relay webhooks; endpoint paths are joined onto it.
    pub webhook_base: Url,
    pub request_timeout: Duration,
    pub payment_poll_interval: Duration,
    pub payment_poll_attempts: u32,
    pub payment_origins: Vec<String>,
    /// Show HH:MM next to message labels in the TUI.
    pub show_timestamps: bool,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingWebhookBase,
    InvalidWebhookBase(String),
    InvalidNumber { var: &'static str, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingWebhookBase => write!(f, "RELAY_WEBHOOK_BASE is not set"),
            ConfigError::InvalidWebhookBase(e) => {
                write!(f, "RELAY_WEBHOOK_BASE is not a valid URL: {}", e)
            }
            ConfigError::InvalidNumber { var, value } => {
                write!(f, "{} must be a positive integer (got {:?})", var, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Configuration pointing at `base`, with every other setting at its default.
    pub fn with_base(base: Url) -> Self {
        Self {
            webhook_base: base,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            payment_poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            payment_poll_attempts: DEFAULT_POLL_ATTEMPTS,
            payment_origins: DEFAULT_PAYMENT_ORIGINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            show_timestamps: false,
        }
    }
}

/// Parse a webhook base URL. A trailing slash is added so relative joins keep the last segment.
pub fn parse_base(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    let url = Url::parse(&with_slash).map_err(|e| ConfigError::InvalidWebhookBase(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidWebhookBase(format!(
            "unsupported scheme {}",
            url.scheme()
        )));
    }
    Ok(url)
}

fn env_u64(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => match v.trim().parse::<u64>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ConfigError::InvalidNumber { var, value: v }),
        },
        _ => Ok(default),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Load configuration from environment. Returns an error if the webhook base is missing or invalid.
pub fn load() -> Result<Config, ConfigError> {
    let raw_base = env::var("RELAY_WEBHOOK_BASE")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .ok_or(ConfigError::MissingWebhookBase)?;
    let mut config = Config::with_base(parse_base(&raw_base)?);

    config.request_timeout =
        Duration::from_secs(env_u64("RELAY_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?);
    config.payment_poll_interval = Duration::from_secs(env_u64(
        "RELAY_PAYMENT_POLL_INTERVAL_SECS",
        DEFAULT_POLL_INTERVAL_SECS,
    )?);
    config.payment_poll_attempts =
        env_u64("RELAY_PAYMENT_POLL_ATTEMPTS", DEFAULT_POLL_ATTEMPTS as u64)?
            .min(u32::MAX as u64) as u32;
    if let Ok(raw) = env::var("RELAY_PAYMENT_ORIGINS") {
        let origins = parse_origins(&raw);
        if !origins.is_empty() {
            config.payment_origins = origins;
        }
    }
    config.show_timestamps = env::var("RELAY_SHOW_TIMESTAMPS")
        .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
        .unwrap_or(false);

    Ok(config)
}
