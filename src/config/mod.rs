//! Configuration management for dndwatch
//!
//! This module handles loading and validating configuration from environment
//! variables and files. Configuration is built once at startup and passed by
//! reference into the dispatcher, producers and sinks — there are no ambient
//! mutable globals.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::scheduler::TriggerConfig;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Telegram delivery settings
    pub telegram: TelegramSettings,

    /// Event producer settings
    pub events: EventsConfig,

    /// Cycle trigger settings
    pub schedule: TriggerConfig,

    /// Outbound HTTP settings
    pub http: HttpConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Telegram delivery settings
///
/// Enabled-but-unconfigured degrades to disabled with an error in the log,
/// never a startup failure: a notifier with a broken sink config should still
/// compute and log its cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramSettings {
    /// Whether the telegram sink is registered at all
    pub enabled: bool,

    /// Bot API token
    pub api_key: Option<String>,

    /// Target chat identifier
    pub chat_id: Option<String>,
}

/// Event producer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Path of the favourites JSON file
    pub favourites_path: PathBuf,

    /// Gate flash event notifications on the favourites list
    pub favourites_only: bool,
}

/// Outbound HTTP settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds, applied to every outbound client
    pub request_timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let telegram_enabled = std::env::var("TELEGRAM_ENABLED")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);
        let telegram_api_key = std::env::var("TELEGRAM_API_KEY").ok().filter(|v| !v.is_empty());
        let telegram_chat_id = std::env::var("TELEGRAM_CHAT_ID").ok().filter(|v| !v.is_empty());

        let favourites_path = std::env::var("DNDWATCH_FAVOURITES_PATH")
            .unwrap_or_else(|_| String::from("favourites.json"))
            .into();

        let favourites_only = std::env::var("DNDWATCH_FAVOURITES_ONLY")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        let daily_time =
            std::env::var("DNDWATCH_DAILY_TIME").unwrap_or_else(|_| String::from("03:00"));

        let hourly_minute = std::env::var("DNDWATCH_HOURLY_MINUTE")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(5);

        let run_on_startup = std::env::var("DNDWATCH_RUN_ON_STARTUP")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        let request_timeout_secs = std::env::var("DNDWATCH_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let log_level =
            std::env::var("DNDWATCH_LOG_LEVEL").unwrap_or_else(|_| String::from("info"));

        let log_format =
            std::env::var("DNDWATCH_LOG_FORMAT").unwrap_or_else(|_| String::from("text"));

        let mut config = Self {
            telegram: TelegramSettings {
                enabled: telegram_enabled,
                api_key: telegram_api_key,
                chat_id: telegram_chat_id,
            },
            events: EventsConfig {
                favourites_path,
                favourites_only,
            },
            schedule: TriggerConfig {
                daily_time,
                hourly_minute,
                run_on_startup,
            },
            http: HttpConfig {
                request_timeout_secs,
            },
            logging: LoggingConfig {
                level: log_level,
                format: log_format,
            },
        };
        config.normalize();

        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;
        config.normalize();

        Ok(config)
    }

    /// Degrade inconsistent sections instead of failing startup
    ///
    /// Telegram enabled without credentials turns the sink off, loudly.
    fn normalize(&mut self) {
        if self.telegram.enabled
            && (self.telegram.api_key.is_none() || self.telegram.chat_id.is_none())
        {
            tracing::error!(
                "Telegram API key and chat ID are required if telegram is enabled. \
                 Disabling telegram delivery."
            );
            self.telegram.enabled = false;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.schedule.validate()?;

        if self.http.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        Ok(())
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.http.request_timeout()
    }
}

impl HttpConfig {
    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram: TelegramSettings {
                enabled: false,
                api_key: None,
                chat_id: None,
            },
            events: EventsConfig {
                favourites_path: PathBuf::from("favourites.json"),
                favourites_only: false,
            },
            schedule: TriggerConfig::default(),
            http: HttpConfig {
                request_timeout_secs: 30,
            },
            logging: LoggingConfig {
                level: String::from("info"),
                format: String::from("text"),
            },
        }
    }
}
