//! Runtime options, serialised as `runtime.toml`.
//!
//! These are host-side knobs that are not part of the settings document the
//! GUI edits: discovery timeout, log filter, auto-play and an optional
//! override of the settings document location.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

/// Top-level runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// How long voice discovery waits for the surface's readiness signal.
    pub discovery_timeout_ms: u64,
    /// `env_logger` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
    /// Read every speakable field as soon as a card side is shown.
    pub auto_play: bool,
    /// Explicit settings document path; `None` uses [`AppPaths::settings_file`].
    pub settings_file: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            discovery_timeout_ms: 3_000,
            log_filter: "info".into(),
            auto_play: false,
            settings_file: None,
        }
    }
}

impl RuntimeConfig {
    /// Load from the platform-appropriate `runtime.toml`.
    ///
    /// Returns `Ok(RuntimeConfig::default())` when the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().runtime_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save to an explicit path, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Discovery timeout as a [`Duration`].
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }

    /// Where the settings document lives.
    pub fn settings_path(&self) -> PathBuf {
        self.settings_file
            .clone()
            .unwrap_or_else(|| AppPaths::new().settings_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = RuntimeConfig::load_from(&path).expect("should not error");
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.discovery_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("runtime.toml");

        let cfg = RuntimeConfig {
            discovery_timeout_ms: 500,
            log_filter: "debug".into(),
            auto_play: true,
            settings_file: Some(dir.path().join("custom.json")),
        };
        cfg.save_to(&path).expect("save");

        let loaded = RuntimeConfig::load_from(&path).expect("load");
        assert_eq!(loaded, cfg);
        assert_eq!(loaded.settings_path(), dir.path().join("custom.json"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("runtime.toml");
        std::fs::write(&path, "log_filter = \"warn\"\n").unwrap();

        let loaded = RuntimeConfig::load_from(&path).expect("load");
        assert_eq!(loaded.log_filter, "warn");
        assert_eq!(loaded.discovery_timeout_ms, 3_000);
        assert!(!loaded.auto_play);
        assert!(loaded.settings_file.is_none());
    }
}
