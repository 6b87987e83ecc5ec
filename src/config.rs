//! Configuration management for the progress channel host
//!
//! Runtime configuration is loaded from a JSON file so the channel name and
//! logging behavior can be adjusted without recompilation. Tick cadence and
//! session length are fixed and intentionally not configurable.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default name of the event channel the UI runtime listens on.
pub const DEFAULT_CHANNEL_NAME: &str =
    "com.chamelalaboratory.demo.flutter_event_channel/eventChannel";

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Event channel settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Name the stream handler is registered under
    #[serde(default = "default_channel_name")]
    pub name: String,
}

fn default_channel_name() -> String {
    DEFAULT_CHANNEL_NAME.to_string()
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            name: default_channel_name(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Maximum level: "error", "warn", "info", "debug" or "trace"
    #[serde(default = "default_level")]
    pub level: String,
    /// Tag used by the Android log layer
    #[serde(default = "default_tag")]
    pub tag: String,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_tag() -> String {
    "From_Native".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            tag: default_tag(),
        }
    }
}

impl LoggingConfig {
    /// Parse the configured level, falling back to INFO on unknown values.
    pub fn max_level(&self) -> tracing::Level {
        self.level.parse().unwrap_or(tracing::Level::INFO)
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// Missing or malformed files are logged and replaced by defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Android builds ship without a readable assets directory; use defaults.
    #[cfg(target_os = "android")]
    pub fn load() -> Self {
        log::info!("[Config] Using default configuration on Android");
        Self::default()
    }

    #[cfg(not(target_os = "android"))]
    pub fn load() -> Self {
        Self::load_from_file("assets/progress_config.json")
    }
}
