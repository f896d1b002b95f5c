//! TOML-based application configuration.
//!
//! Stores the handful of user preferences the timer core cares about.
//! Configuration is stored at `~/.config/focusloop/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::{ConfigError, Result};

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/focusloop/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Duration pre-filled for new sessions when no preset was chosen yet.
    #[serde(default = "default_preset_min")]
    pub default_preset_min: u32,
    /// Foreground tick cadence in seconds.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,
    /// One-shot haptic pulse on natural completion.
    #[serde(default = "default_true")]
    pub haptics: bool,
}

fn default_preset_min() -> u32 {
    25
}
fn default_tick_interval() -> u64 {
    1
}
fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_preset_min: default_preset_min(),
            tick_interval_secs: default_tick_interval(),
            haptics: true,
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing defaults on first run.
    ///
    /// Only a missing file counts as first run; any other read failure
    /// (permissions, transient IO) propagates rather than clobbering an
    /// existing config with defaults.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or
    /// parsed, or if the default file cannot be written.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    fn load_from(path: &std::path::Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)
                    .map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Load from disk, falling back to defaults on any failure.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Persist to disk.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    fn save_to(&self, path: &std::path::Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_preset_min, 25);
        assert_eq!(parsed.tick_interval_secs, 1);
        assert!(parsed.haptics);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let parsed: Config = toml::from_str("default_preset_min = 50\n").unwrap();
        assert_eq!(parsed.default_preset_min, 50);
        assert_eq!(parsed.tick_interval_secs, 1);
        assert!(parsed.haptics);
    }

    #[test]
    fn missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.default_preset_min, 25);
        assert!(path.exists());
    }

    #[test]
    fn unreadable_config_propagates_instead_of_clobbering() {
        let dir = tempfile::tempdir().unwrap();
        // A path that exists but cannot be read as a file.
        let path = dir.path().join("config.toml");
        std::fs::create_dir(&path).unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
