use std::collections::BTreeMap;

use portal_core::catalogue::DEFAULT_THEME_WEIGHTS;
use portal_core::{AnimationRegistry, ConfigError};
use portal_persistence::{load_json, save_json, KeyValueStore, StorageError};
use serde::{Deserialize, Serialize};

/// User preferences persisted next to the animation memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortalSettings {
    pub sound_enabled: bool,
    /// Play the transition before changing route instead of alongside it.
    pub blocking_navigation: bool,
    pub reduce_repeat_animations: bool,
    pub primary_theme: String,
    pub theme_weights: BTreeMap<String, u32>,
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            blocking_navigation: true,
            reduce_repeat_animations: true,
            primary_theme: portal_config::DEFAULT_PRIMARY_THEME.to_string(),
            theme_weights: DEFAULT_THEME_WEIGHTS
                .iter()
                .map(|(theme, weight)| (theme.to_string(), *weight))
                .collect(),
        }
    }
}

impl PortalSettings {
    pub fn load(store: &dyn KeyValueStore) -> Result<Self, StorageError> {
        Ok(load_json(store, portal_config::SETTINGS_STORAGE_KEY)?.unwrap_or_default())
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), StorageError> {
        save_json(store, portal_config::SETTINGS_STORAGE_KEY, self)
    }

    /// Stores a clamped weight and returns the value actually kept.
    pub fn set_theme_weight(&mut self, theme: &str, weight: u32) -> u32 {
        let weight = portal_config::clamp_theme_weight(weight);
        self.theme_weights.insert(theme.to_string(), weight);
        weight
    }

    /// Pushes primary theme and clamped theme weights into `registry`.
    pub fn apply_to(&self, registry: &mut AnimationRegistry) -> Result<(), ConfigError> {
        registry.set_primary_theme(self.primary_theme.as_str());
        for (theme, weight) in &self.theme_weights {
            registry.set_theme_weight(theme.as_str(), portal_config::clamp_theme_weight(*weight))?;
        }
        Ok(())
    }
}
