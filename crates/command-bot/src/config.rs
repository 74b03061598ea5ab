//! Application configuration loaded from environment variables.

use anyhow::{Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Signal configuration
    pub signal: SignalConfig,

    /// Bot behaviour
    #[serde(default)]
    pub bot: BotConfig,

    /// Settings file locations
    #[serde(default)]
    pub storage: StorageConfig,

    /// Timers for rendered surfaces
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignalConfig {
    /// Signal CLI REST API endpoint
    #[serde(default = "default_signal_service")]
    pub service_url: String,

    /// The bot's registered phone number
    pub phone_number: String,

    /// Poll interval for messages
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Command prefix used where no custom prefix is set
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `text` or `json`
    #[serde(default)]
    pub log_format: LogFormat,

    /// Show handler fault details in replies
    #[serde(default)]
    pub diagnostics: bool,

    /// Principals holding every capability (comma-separated)
    #[serde(default, deserialize_with = "comma_list")]
    pub owners: Vec<String>,

    /// Principals allowed to manage groups and messages (comma-separated)
    #[serde(default, deserialize_with = "comma_list")]
    pub admins: Vec<String>,

    /// Offset used to read dates and times without one, e.g. `-08:00`
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the settings files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// How often group descriptions are regenerated
    #[serde(default = "default_surface_cadence", with = "humantime_serde")]
    pub surface_cadence: Duration,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            diagnostics: false,
            owners: Vec::new(),
            admins: Vec::new(),
            utc_offset: default_utc_offset(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            surface_cadence: default_surface_cadence(),
        }
    }
}

impl BotConfig {
    /// Parsed `utc_offset`.
    pub fn offset(&self) -> Result<FixedOffset> {
        parse_offset(&self.utc_offset)
            .with_context(|| format!("Invalid BOT__UTC_OFFSET `{}`", self.utc_offset))
    }
}

fn default_signal_service() -> String {
    "http://signal-api:8080".into()
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(200)
}

fn default_prefix() -> String {
    "!".into()
}

fn default_log_level() -> String {
    "info".into()
}

fn default_utc_offset() -> String {
    "+00:00".into()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_surface_cadence() -> Duration {
    Duration::from_secs(10 * 60)
}

fn comma_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect())
}

/// Parse `Z`, `+HH:MM`, `-HH:MM` or `+HH`.
pub fn parse_offset(raw: &str) -> Result<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).context("zero offset");
    }

    let (sign, rest) = match raw.split_at_checked(1) {
        Some(("+", rest)) => (1, rest),
        Some(("-", rest)) => (-1, rest),
        _ => anyhow::bail!("offset must start with + or -"),
    };

    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h.parse::<i32>()?, m.parse::<i32>()?),
        None => (rest.parse::<i32>()?, 0),
    };
    if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
        anyhow::bail!("offset out of range");
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).context("offset out of range")
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    // Parsing would turn +15555555555 into a number and drop the +.
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
