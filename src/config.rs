//! Configuration for focus-pulse.

use crate::engine::Allowlist;
use crate::monitor::MonitorSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Main configuration, persisted as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Programs whose foreground time counts
    pub allowlist: Allowlist,

    /// Foreground poll cadence
    #[serde(with = "duration_ms")]
    pub poll_interval: Duration,

    /// Inactivity after the last input before the user counts as idle
    #[serde(with = "duration_ms")]
    pub idle_timeout: Duration,

    /// Which input sources to observe
    pub sources: SourceConfig,

    /// Roaming avatar settings
    pub avatar: AvatarConfig,

    /// Path for the ledger
    pub data_path: PathBuf,

    /// Whether monitoring is paused
    pub paused: bool,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("focus-pulse");

        Self {
            allowlist: Allowlist::default(),
            poll_interval: Duration::from_millis(1000),
            idle_timeout: Duration::from_millis(5000),
            sources: SourceConfig::default(),
            avatar: AvatarConfig::default(),
            data_path: data_dir,
            paused: false,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject timings the monitor cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "poll_interval must be at least 1 ms".to_string(),
            ));
        }
        if self.idle_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "idle_timeout must be at least 1 ms".to_string(),
            ));
        }
        Ok(())
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("focus-pulse")
            .join("config.json")
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_path.join("ledger.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)?;
        Ok(())
    }

    /// Monitor timing and allowlist taken from this config.
    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            poll_interval: self.poll_interval,
            idle_timeout: self.idle_timeout,
            allowlist: self.allowlist.clone(),
        }
    }

    /// Append a program unless an entry already normalizes to it.
    ///
    /// Returns true if the allowlist changed.
    pub fn allow(&mut self, program: &str) -> bool {
        let program = program.trim();
        if program.is_empty() || self.allowlist.contains_exact(program) {
            return false;
        }
        let mut entries = self.allowlist.entries().to_vec();
        entries.push(program.to_string());
        self.allowlist = Allowlist::new(entries);
        true
    }

    /// Remove every entry that normalizes to the same name as `program`.
    ///
    /// Returns true if the allowlist changed.
    pub fn disallow(&mut self, program: &str) -> bool {
        let target = crate::engine::normalize(program);
        let before = self.allowlist.len();
        let entries: Vec<String> = self
            .allowlist
            .entries()
            .iter()
            .filter(|entry| crate::engine::normalize(entry) != target)
            .cloned()
            .collect();
        self.allowlist = Allowlist::new(entries);
        self.allowlist.len() != before
    }
}

/// Configuration for which input sources to observe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub keyboard: bool,
    pub mouse: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            keyboard: true,
            mouse: true,
        }
    }
}

impl SourceConfig {
    /// Parse source configuration from a comma-separated string.
    pub fn from_csv(s: &str) -> Self {
        let sources: Vec<String> = s.split(',').map(|s| s.trim().to_lowercase()).collect();

        Self {
            keyboard: sources.iter().any(|s| s == "keyboard" || s == "all"),
            mouse: sources.iter().any(|s| s == "mouse" || s == "all"),
        }
    }

    /// Check if at least one source is enabled.
    pub fn any_enabled(&self) -> bool {
        self.keyboard || self.mouse
    }
}

/// Configuration for the roaming avatar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarConfig {
    pub enabled: bool,
    /// Glyph or image marker the renderer draws
    pub marker: String,
    /// Primary display work area, in pixels
    pub screen_width: u32,
    pub screen_height: u32,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            marker: "🐱".to_string(),
            screen_width: 1920,
            screen_height: 1080,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Serde support for Duration as whole milliseconds.
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_config_parsing() {
        let config = SourceConfig::from_csv("keyboard,mouse");
        assert!(config.keyboard);
        assert!(config.mouse);

        let config = SourceConfig::from_csv("keyboard");
        assert!(config.keyboard);
        assert!(!config.mouse);

        let config = SourceConfig::from_csv("all");
        assert!(config.keyboard);
        assert!(config.mouse);

        assert!(!SourceConfig::from_csv("trackpad").any_enabled());
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.poll_interval, Duration::from_millis(1000));
        assert_eq!(config.idle_timeout, Duration::from_millis(5000));
        assert!(config.allowlist.is_empty());
        assert!(!config.avatar.enabled);
        assert!(!config.paused);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.allow("Notion.exe");
        config.idle_timeout = Duration::from_millis(7500);
        config.save_to(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"idle_timeout\": 7500"));
        assert!(raw.contains("\"Notion.exe\""));

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.allowlist.entries(), ["Notion.exe"]);
        assert_eq!(loaded.idle_timeout, Duration::from_millis(7500));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.allowlist.is_empty());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "allowlist": ["code"] }"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.allowlist.entries(), ["code"]);
        assert_eq!(loaded.poll_interval, Duration::from_millis(1000));
    }

    #[test]
    fn test_zero_intervals_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        std::fs::write(&path, r#"{ "poll_interval": 0 }"#).unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Invalid(_))
        ));

        std::fs::write(&path, r#"{ "idle_timeout": 0 }"#).unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_allow_and_disallow() {
        let mut config = Config::default();
        assert!(config.allow("Code.exe"));
        assert!(!config.allow("code"));
        assert!(!config.allow("   "));
        assert!(config.allow("Notion"));

        assert!(config.disallow("CODE"));
        assert_eq!(config.allowlist.entries(), ["Notion"]);
        assert!(!config.disallow("firefox"));
    }
}
