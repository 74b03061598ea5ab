//! Settings files the bot keeps under its data directory.

use serde::{Deserialize, Serialize};
use settings_store::{SettingsError, SettingsStore};
use std::path::Path;
use tracing::info;

/// Key of the dynamic message list in the schedules file.
pub const DYNAMIC_MESSAGES: &str = "dynamicMessages";

/// Key of the description templates (group id to template) in the
/// schedules file.
pub const DESCRIPTIONS: &str = "descriptions";

/// One bot message rewritten on a timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicMessage {
    pub channel: String,
    pub guild: Option<String>,
    /// Send timestamp of the message being rewritten.
    pub message_timestamp: i64,
    pub command: String,
    pub interval_minutes: u64,
}

impl DynamicMessage {
    pub fn key(&self) -> String {
        format!("dynamic:{}:{}", self.channel, self.message_timestamp)
    }
}

/// The bot's settings files.
///
/// * `settings.json`: custom prefixes
/// * `countdowns.json`: countdowns, keyed by group or direct channel id
/// * `schedules.json`: dynamic messages and description templates
#[derive(Clone)]
pub struct Stores {
    pub settings: SettingsStore,
    pub countdowns: SettingsStore,
    pub schedules: SettingsStore,
}

impl Stores {
    pub async fn load(data_dir: &Path) -> Result<Self, SettingsError> {
        let stores = Self {
            settings: SettingsStore::load(data_dir.join("settings.json")).await?,
            countdowns: SettingsStore::load(data_dir.join("countdowns.json")).await?,
            schedules: SettingsStore::load(data_dir.join("schedules.json")).await?,
        };
        info!("Settings ready in {}", data_dir.display());
        Ok(stores)
    }

    pub fn in_memory() -> Self {
        Self {
            settings: SettingsStore::in_memory(),
            countdowns: SettingsStore::in_memory(),
            schedules: SettingsStore::in_memory(),
        }
    }

    /// Reread every file, discarding unsaved changes.
    pub async fn reload_all(&self) -> Result<(), SettingsError> {
        self.settings.reload().await?;
        self.countdowns.reload().await?;
        self.schedules.reload().await?;
        Ok(())
    }
}
