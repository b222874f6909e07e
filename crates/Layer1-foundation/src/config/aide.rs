//! Application settings
//!
//! `config.json` holds everything that is not a per-service setting.

use crate::cache::CacheConfig;
use crate::storage::JsonStore;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Settings file name
pub const AIDE_CONFIG_FILE: &str = "config.json";

fn default_version() -> u32 {
    1
}

/// aide application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AideConfig {
    /// Schema version (for migrations)
    #[serde(default = "default_version")]
    pub version: u32,

    /// Log filter used when `RUST_LOG` is unset (e.g. "info", "aide_api=debug")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    #[serde(default)]
    pub cache: CacheConfig,
}

impl Default for AideConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            log_level: None,
            cache: CacheConfig::default(),
        }
    }
}

impl AideConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Global then project settings
    pub fn load() -> Result<Self> {
        let mut config = Self::new();

        if let Ok(global) = JsonStore::global() {
            if let Some(global_config) = global.load_optional::<AideConfig>(AIDE_CONFIG_FILE)? {
                config.merge(global_config);
            }
        }

        if let Ok(project) = JsonStore::current_project() {
            if let Some(project_config) = project.load_optional::<AideConfig>(AIDE_CONFIG_FILE)? {
                config.merge(project_config);
            }
        }

        Ok(config)
    }

    pub fn load_from(store: &JsonStore) -> Result<Self> {
        Ok(store.load_or_default(AIDE_CONFIG_FILE))
    }

    pub fn save_to(&self, store: &JsonStore) -> Result<()> {
        store.save(AIDE_CONFIG_FILE, self)
    }

    pub fn merge(&mut self, other: AideConfig) {
        self.version = self.version.max(other.version);
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
        self.cache.merge(other.cache);
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }
}
