//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\camelot-sort\config.toml
//! - macOS: ~/Library/Application Support/camelot-sort/config.toml
//! - Linux: ~/.config/camelot-sort/config.toml
//!
//! Every field has a default, so a partial file (or none at all) is fine.
//! Command-line flags override individual fields after loading.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output directory names
    pub output: OutputConfig,

    /// Classification and splitting thresholds
    pub sorting: SortingConfig,

    /// External tools
    pub tools: ToolsConfig,
}

/// Names of the output directories, relative to the traversal root.
///
/// The numeric prefixes only keep the folders at the bottom of a
/// key-sorted listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub one_shots: String,
    pub parts: String,
    pub unlabeled: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            one_shots: "11. OneShots".to_string(),
            parts: "12. Parts".to_string(),
            unlabeled: "13. Unlabeled".to_string(),
        }
    }
}

/// Thresholds for the sorting engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortingConfig {
    /// Files strictly shorter than this are one-shots
    pub one_shot_max_secs: f64,

    /// Files strictly longer than this are split
    pub split_threshold_secs: u64,

    /// Length of each part (the last one holds the remainder)
    pub segment_secs: u64,

    /// Worker threads; 1 processes files one at a time
    pub jobs: usize,
}

impl Default for SortingConfig {
    fn default() -> Self {
        Self {
            one_shot_max_secs: 2.0,
            split_threshold_secs: 600,
            segment_secs: 600,
            jobs: 1,
        }
    }
}

impl SortingConfig {
    pub fn one_shot_limit(&self) -> Duration {
        Duration::from_secs_f64(self.one_shot_max_secs.max(0.0))
    }

    pub fn split_threshold_ms(&self) -> u64 {
        self.split_threshold_secs.saturating_mul(1000)
    }

    pub fn segment_ms(&self) -> u64 {
        self.segment_secs.saturating_mul(1000)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.segment_secs == 0 {
            return Err(ConfigError::Invalid("sorting.segment_secs must be > 0".into()));
        }
        if self.jobs == 0 {
            return Err(ConfigError::Invalid("sorting.jobs must be > 0".into()));
        }
        if !self.one_shot_max_secs.is_finite() || self.one_shot_max_secs < 0.0 {
            return Err(ConfigError::Invalid(
                "sorting.one_shot_max_secs must be a non-negative number".into(),
            ));
        }
        Ok(())
    }
}

/// External tool locations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// ffmpeg used for stream-copy splitting of non-WAV files
    /// (None = search PATH and common install locations)
    pub ffmpeg_path: Option<PathBuf>,
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("camelot-sort"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from the default location.
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };
    load_from(&path)
}

/// Load configuration from an explicit file, falling back to defaults.
pub fn load_from(path: &Path) -> Config {
    if !path.exists() {
        tracing::debug!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("Failed to parse config file {:?}: {}", path, e);
                tracing::warn!("Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

/// Save configuration to `path`.
///
/// Creates the parent directory if it doesn't exist.
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(())
}

/// Save configuration to the default location.
pub fn save(config: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    save_to(config, &path)?;
    Ok(path)
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        crate::error::Error::config(e.to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[output]"));
        assert!(toml.contains("[sorting]"));
        assert!(toml.contains("[tools]"));
    }

    #[test]
    fn test_defaults_match_engine_constants() {
        let sorting = SortingConfig::default();
        assert_eq!(sorting.split_threshold_ms(), 600_000);
        assert_eq!(sorting.segment_ms(), 600_000);
        assert_eq!(sorting.one_shot_limit(), Duration::from_secs(2));
        assert_eq!(sorting.jobs, 1);
        assert!(sorting.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
[output]
parts = "Parts"

[sorting]
jobs = 4
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.output.parts, "Parts");
        assert_eq!(config.output.one_shots, "11. OneShots");
        assert_eq!(config.sorting.jobs, 4);
        assert_eq!(config.sorting.segment_secs, 600);
        assert!(config.tools.ffmpeg_path.is_none());
    }

    #[test]
    fn test_validate_rejects_zero_segment() {
        let sorting = SortingConfig {
            segment_secs: 0,
            ..SortingConfig::default()
        };
        assert!(matches!(sorting.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.sorting.one_shot_max_secs = 1.5;
        config.tools.ffmpeg_path = Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));

        save_to(&config, &path).unwrap();
        let loaded = load_from(&path);

        assert_eq!(loaded.sorting.one_shot_max_secs, 1.5);
        assert_eq!(
            loaded.tools.ffmpeg_path,
            Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg"))
        );
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn test_broken_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();

        let config = load_from(&path);
        assert_eq!(config.output, OutputConfig::default());
    }
}
