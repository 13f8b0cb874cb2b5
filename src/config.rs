//! Client configuration management.
//!
//! This module handles loading and saving the client configuration, which
//! includes the remote store's base URL and the cache encryption secret.
//!
//! Configuration is stored at `~/.config/shopsync/config.json`.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::cache::CipherCodec;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "shopsync";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Salt for stretching the cache secret into a key.
const KEY_SALT: &[u8] = b"shopsync-cache-key-v1";

/// Fallback secret for installs that configured none.
///
/// A fixed secret only obscures the cache from casual inspection; anyone
/// shipping this for real should set `cache_secret` (or the
/// SHOPSYNC_CACHE_SECRET env var) from a managed secret store.
const DEFAULT_CACHE_SECRET: &str = "shopsync-dev-cache-secret";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Base URL of the remote catalog store.
    pub base_url: Option<String>,
    /// Secret the cache key is derived from; env var wins over this.
    pub cache_secret: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Resolve the cache secret: env var, then config, then the built-in
    /// development fallback.
    pub fn cache_secret(&self) -> String {
        std::env::var("SHOPSYNC_CACHE_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| self.cache_secret.clone())
            .unwrap_or_else(|| DEFAULT_CACHE_SECRET.to_string())
    }

    /// Build the cache codec from the resolved secret.
    pub fn codec(&self) -> Result<CipherCodec> {
        CipherCodec::from_secret(&self.cache_secret(), KEY_SALT)
    }
}
