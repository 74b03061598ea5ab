//! Per-conversation command prefixes.

use async_trait::async_trait;
use command_engine::{ExecutionContext, PrefixSource};
use settings_store::SettingsStore;
use std::collections::HashMap;
use tracing::warn;

/// Settings key of the prefix map, keyed by group id or direct channel id.
pub const CUSTOM_PREFIXES: &str = "customPrefixes";

/// Reads custom prefixes from the settings store, falling back to the
/// configured default.
#[derive(Clone)]
pub struct SettingsPrefixes {
    store: SettingsStore,
    default: String,
}

impl SettingsPrefixes {
    pub fn new(store: SettingsStore, default: impl Into<String>) -> Self {
        Self {
            store,
            default: default.into(),
        }
    }
}

#[async_trait]
impl PrefixSource for SettingsPrefixes {
    async fn prefix_for(&self, ctx: &ExecutionContext) -> String {
        let Some(key) = ctx.storage_key() else {
            return self.default.clone();
        };

        match self.store.get::<HashMap<String, String>>(CUSTOM_PREFIXES).await {
            Ok(Some(prefixes)) => prefixes
                .get(key)
                .cloned()
                .unwrap_or_else(|| self.default.clone()),
            Ok(None) => self.default.clone(),
            Err(e) => {
                warn!(error = %e, "Unreadable prefix table, using default");
                self.default.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{direct, group};

    #[tokio::test]
    async fn test_default_and_custom_prefixes() {
        let store = SettingsStore::in_memory();
        let prefixes = SettingsPrefixes::new(store.clone(), "!");

        assert_eq!(prefixes.prefix_for(&group("+1", "hi")).await, "!");

        let mut map = HashMap::new();
        map.insert("group-1".to_string(), "?".to_string());
        store.set(CUSTOM_PREFIXES, &map).await.unwrap();

        assert_eq!(prefixes.prefix_for(&group("+1", "hi")).await, "?");
        assert_eq!(prefixes.prefix_for(&direct("+1", "hi")).await, "!");
    }

    #[tokio::test]
    async fn test_malformed_table_falls_back() {
        let store = SettingsStore::in_memory();
        store.set(CUSTOM_PREFIXES, &vec![1, 2, 3]).await.unwrap();

        let prefixes = SettingsPrefixes::new(store, "!");
        assert_eq!(prefixes.prefix_for(&group("+1", "hi")).await, "!");
    }
}
