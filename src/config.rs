//! Gateway configuration.
//!
//! A small JSON file at `~/.config/icloud-bridge/config.json` holding the
//! per-call timeout and listing defaults. Every field has a default, so a
//! missing file or a partial file is fine.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for the config directory path.
const APP_NAME: &str = "icloud-bridge";

/// Config file name.
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Per-tool-call timeout. 30s allows for slow backends while failing
    /// fast enough that the outer transport never hangs indefinitely.
    pub call_timeout_secs: u64,

    /// Default `calendar_list_events` window when no range is given.
    pub event_window_days: i64,

    /// Default page size for `mail_list_messages` when no limit is given.
    pub message_page_limit: i64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            call_timeout_secs: 30,
            event_window_days: 7,
            message_page_limit: crate::tools::MESSAGE_LIMIT_DEFAULT,
        }
    }
}

impl GatewayConfig {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    fn save_to(&self, path: &Path) -> Result<()> {
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
}
