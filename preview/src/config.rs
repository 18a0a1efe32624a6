use anyhow::{Context, Result};
use common::VideoSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use crate::validate_enum;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralSettings,

    #[serde(default)]
    pub video: VideoSettings,

    #[serde(default)]
    pub preview: PreviewSettings,
}

/// General host settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralSettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Render loop settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PreviewSettings {
    /// Ticks per second driving Update/Draw
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            tick_rate: default_tick_rate(),
        }
    }
}

fn default_tick_rate() -> u32 {
    60
}

impl Config {
    /// Load configuration from a specific path, defaults when it does not exist
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        config.expand_paths()?;

        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("attract");

        Ok(config_dir.join("config.toml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        self.validate_log_level(&self.general.log_level)?;

        if self.preview.tick_rate == 0 || self.preview.tick_rate > 240 {
            anyhow::bail!(
                "Invalid tick rate (must be 1-240): {}",
                self.preview.tick_rate
            );
        }

        Ok(())
    }

    fn validate_log_level(&self, level: &str) -> Result<()> {
        validate_enum!(level, "trace", "debug", "info", "warn", "error")
    }

    /// Expand `~` and environment variables in configured directories
    fn expand_paths(&mut self) -> Result<()> {
        self.video.media_root = self
            .video
            .media_root
            .as_deref()
            .map(expand_path)
            .transpose()?;
        self.video.plugin_path = self
            .video
            .plugin_path
            .as_deref()
            .map(expand_path)
            .transpose()?;
        Ok(())
    }
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .with_context(|| format!("Failed to expand path: {}", raw))?;
    Ok(PathBuf::from(expanded.as_ref()))
}
