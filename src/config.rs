//! Daemon configuration.
//!
//! JSON file, load-or-default: a missing or broken file never stops
//! the daemon from starting.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Presentation monitor period in seconds.
    pub monitor_period_secs: u64,
    /// Battery stream period in seconds.
    pub battery_stream_period_secs: u64,
    /// Unix socket the overlay widget connects to.
    pub socket_path: PathBuf,
    /// App name used for the fallback notification.
    pub notification_app_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            monitor_period_secs: 5,
            battery_stream_period_secs: 30,
            socket_path: default_socket_path(),
            notification_app_name: "nowbar".into(),
        }
    }
}

fn default_socket_path() -> PathBuf {
    let base = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(base).join("nowbar.sock")
}

impl Config {
    fn config_path() -> Option<PathBuf> {
        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(".config/nowbar/config.json"))
    }

    /// Load the user config, writing a default file on first run so
    /// there is something to edit.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_or_init(&path),
            None => Self::default(),
        }
    }

    fn load_or_init(path: &Path) -> Self {
        if path.exists() {
            return Self::load_from(path);
        }
        let config = Self::default();
        if let Err(e) = config.save(path) {
            warn!("could not write default config to {}: {e}", path.display());
        }
        config
    }

    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("config parse failed ({e}), using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
    }

    pub fn monitor_period(&self) -> Duration {
        Duration::from_secs(self.monitor_period_secs)
    }

    pub fn battery_stream_period(&self) -> Duration {
        Duration::from_secs(self.battery_stream_period_secs)
    }
}
